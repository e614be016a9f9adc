//! Boundary conversions used by simplification.
//!
//! A [`ConversionTable`] is a directed graph over nominal types whose edges
//! carry a [`Loss`] and a runtime conversion. [`ConversionTable::cheapest_chain`]
//! finds the lowest-loss path between two types, never crossing an infinite
//! edge.
//!
//! Runtime representations follow the standard leaf operations: `Byte`..`Long`
//! are `i8`..`i64`, `Float`/`Double` are `f32`/`f64`, `List<T>` is
//! `Vec<Value>`, and `Array<T>` is `Box<[Value]>`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;

use opsmith_primitives::{OpError, Ty, TypeService, Value};
use rustc_hash::FxHashMap;

/// Cost of one conversion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Loss {
	Finite(u32),
	/// Never taken implicitly.
	Infinite,
}

/// Runtime body of a conversion.
pub type ConvertFn = Arc<dyn Fn(&Value) -> Result<Value, OpError> + Send + Sync>;

/// A directed conversion edge.
///
/// `from` and `to` may carry type variables in their arguments
/// (`Array<T>` to `List<T>`); the arguments are carried positionally.
#[derive(Clone)]
pub struct Conversion {
	pub from: Ty,
	pub to: Ty,
	pub loss: Loss,
	pub convert: ConvertFn,
}

impl fmt::Debug for Conversion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} -> {} ({:?})", self.from, self.to, self.loss)
	}
}

/// An instantiated path of conversions.
#[derive(Clone, Default)]
pub struct ConversionChain {
	steps: Vec<(Ty, Ty, ConvertFn)>,
	loss: u32,
}

impl ConversionChain {
	pub fn identity() -> Self {
		Self::default()
	}

	pub fn is_identity(&self) -> bool {
		self.steps.is_empty()
	}

	pub fn loss(&self) -> u32 {
		self.loss
	}

	pub fn len(&self) -> usize {
		self.steps.len()
	}

	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	/// Type produced by the last step, if any.
	pub fn target(&self) -> Option<&Ty> {
		self.steps.last().map(|(_, to, _)| to)
	}

	/// Applies every step in order.
	pub fn apply(&self, value: &Value) -> Result<Value, OpError> {
		let mut cur = value.clone();
		for (_, _, convert) in &self.steps {
			cur = convert(&cur)?;
		}
		Ok(cur)
	}
}

impl fmt::Debug for ConversionChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.steps.is_empty() {
			return f.write_str("identity");
		}
		for (i, (from, to, _)) in self.steps.iter().enumerate() {
			if i == 0 {
				write!(f, "{from}")?;
			}
			write!(f, " -> {to}")?;
		}
		write!(f, " (loss {})", self.loss)
	}
}

/// Directed graph of conversions keyed by source type name.
#[derive(Clone, Default)]
pub struct ConversionTable {
	edges: FxHashMap<Arc<str>, Vec<Conversion>>,
}

fn numeric<T, U>(f: fn(T) -> U) -> ConvertFn
where
	T: Copy + Send + Sync + 'static,
	U: Send + Sync + 'static,
{
	Arc::new(move |v: &Value| -> Result<Value, OpError> {
		let x = v.expect_ref::<T>()?;
		Ok(Value::new(f(*x)))
	})
}

fn refuse(from: &'static str, to: &'static str) -> ConvertFn {
	Arc::new(move |_: &Value| -> Result<Value, OpError> {
		Err(OpError::failed(format!("lossy conversion {from} -> {to} refused")))
	})
}

impl ConversionTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Numeric widening and narrowing plus array boxing.
	pub fn standard() -> Self {
		let t = Ty::named;
		let mut table = Self::new();

		// lossless widening
		table.add(t("Byte"), t("Short"), Loss::Finite(1), numeric(|x: i8| i16::from(x)));
		table.add(t("Short"), t("Integer"), Loss::Finite(1), numeric(|x: i16| i32::from(x)));
		table.add(t("Integer"), t("Long"), Loss::Finite(1), numeric(|x: i32| i64::from(x)));
		table.add(t("Integer"), t("Double"), Loss::Finite(1), numeric(|x: i32| f64::from(x)));
		table.add(t("Float"), t("Double"), Loss::Finite(1), numeric(|x: f32| f64::from(x)));
		table.add(t("Short"), t("Float"), Loss::Finite(1), numeric(|x: i16| f32::from(x)));

		// lossy widening
		table.add(t("Long"), t("Double"), Loss::Finite(2), numeric(|x: i64| x as f64));
		table.add(t("Integer"), t("Float"), Loss::Finite(2), numeric(|x: i32| x as f32));

		// narrowing
		table.add(t("Double"), t("Float"), Loss::Finite(4), numeric(|x: f64| x as f32));
		table.add(t("Long"), t("Integer"), Loss::Infinite, refuse("Long", "Integer"));
		table.add(t("Integer"), t("Short"), Loss::Infinite, refuse("Integer", "Short"));
		table.add(t("Short"), t("Byte"), Loss::Infinite, refuse("Short", "Byte"));

		// boxing
		let var = Ty::var("T");
		table.add(
			Ty::generic("Array", [var.clone()]),
			Ty::generic("List", [var]),
			Loss::Finite(1),
			Arc::new(|v: &Value| -> Result<Value, OpError> {
				let items = v.expect_ref::<Box<[Value]>>()?;
				Ok(Value::new(items.to_vec()))
			}),
		);
		table
	}

	/// Adds an edge. Later edges between the same types take precedence.
	pub fn add(&mut self, from: Ty, to: Ty, loss: Loss, convert: ConvertFn) {
		let Some(name) = from.name() else {
			return;
		};
		let edges = self.edges.entry(Arc::from(name)).or_default();
		edges.retain(|c| c.to != to);
		edges.push(Conversion {
			from,
			to,
			loss,
			convert,
		});
	}

	/// Builder-style [`ConversionTable::add`].
	pub fn with(mut self, from: Ty, to: Ty, loss: Loss, convert: ConvertFn) -> Self {
		self.add(from, to, loss, convert);
		self
	}

	pub fn len(&self) -> usize {
		self.edges.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.edges.is_empty()
	}

	/// Edges leaving `ty`, instantiated with its generic arguments.
	fn successors<'a>(&'a self, ty: &'a Ty) -> impl Iterator<Item = (Ty, u32, &'a ConvertFn)> + 'a {
		let edges = ty.name().and_then(|n| self.edges.get(n));
		edges.into_iter().flatten().filter_map(move |edge| {
			let Loss::Finite(loss) = edge.loss else {
				return None;
			};
			let target = instantiate(&edge.from, &edge.to, ty)?;
			Some((target, loss, &edge.convert))
		})
	}

	/// Lowest-loss chain converting `from` into something assignable to `to`.
	///
	/// Returns the identity chain when `from` is already assignable. Chains
	/// longer than `max_steps` or crossing an infinite edge are never produced.
	pub fn cheapest_chain(
		&self,
		from: &Ty,
		to: &Ty,
		types: &dyn TypeService,
		max_steps: usize,
	) -> Option<ConversionChain> {
		if types.assignable(from, to) {
			return Some(ConversionChain::identity());
		}

		let mut nodes: Vec<Node> = vec![Node {
			ty: from.clone(),
			prev: None,
			steps: 0,
		}];
		let mut best: FxHashMap<Ty, u32> = FxHashMap::default();
		best.insert(from.clone(), 0);
		let mut heap = BinaryHeap::new();
		heap.push(Reverse((0u32, 0usize)));

		while let Some(Reverse((cost, idx))) = heap.pop() {
			if best.get(&nodes[idx].ty).is_some_and(|&b| b < cost) {
				continue;
			}
			if idx != 0 && types.assignable(&nodes[idx].ty, to) {
				return Some(unwind(&nodes, idx, cost));
			}
			if nodes[idx].steps >= max_steps {
				continue;
			}
			let here = nodes[idx].ty.clone();
			let steps = nodes[idx].steps + 1;
			for (target, loss, convert) in self.successors(&here) {
				let next = cost + loss;
				if best.get(&target).is_some_and(|&b| b <= next) {
					continue;
				}
				best.insert(target.clone(), next);
				nodes.push(Node {
					ty: target,
					prev: Some((idx, convert.clone())),
					steps,
				});
				heap.push(Reverse((next, nodes.len() - 1)));
			}
		}
		None
	}
}

struct Node {
	ty: Ty,
	prev: Option<(usize, ConvertFn)>,
	steps: usize,
}

fn unwind(nodes: &[Node], mut idx: usize, loss: u32) -> ConversionChain {
	let mut steps = Vec::new();
	while let Some((prev, convert)) = &nodes[idx].prev {
		steps.push((nodes[*prev].ty.clone(), nodes[idx].ty.clone(), convert.clone()));
		idx = *prev;
	}
	steps.reverse();
	ConversionChain { steps, loss }
}

/// Carries the arguments of `actual` through an edge pattern.
fn instantiate(pattern_from: &Ty, pattern_to: &Ty, actual: &Ty) -> Option<Ty> {
	let from_args = pattern_from.args();
	if from_args.is_empty() {
		return Some(pattern_to.clone());
	}
	let actual_args = actual.args();
	if actual_args.len() != from_args.len() {
		return None;
	}
	let name = pattern_to.name()?;
	let args = pattern_to.args().iter().map(|arg| {
		from_args
			.iter()
			.position(|p| p == arg)
			.map_or_else(|| arg.clone(), |i| actual_args[i].clone())
	});
	Some(Ty::generic(name, args.collect::<Vec<_>>()))
}
