//! Trace (tape) recording for reverse-mode differentiation.
//!
//! A [`Trace`] is an append-only arena of [`Node`]s. Tracked values refer
//! to their node by index, so every node can only reference nodes created
//! before it and the recorded graph is a DAG by construction.
//!
//! The lifecycle of a trace is `building -> built -> consumed`: values are
//! recorded while building, [`Trace::finish`] seals it into an immutable
//! [`Tape`], and the backward pass consumes the tape. Operations on values
//! of a sealed trace are rejected.

use crate::ops::Primitive;
use adjoint_core::{AutodiffError, Result, Scalar};
use log::{debug, trace};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Unique identifier for nodes in a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node{}", self.0)
    }
}

/// What produced a node.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeOp {
    /// Differentiation input.
    Leaf,
    /// Constant operand; adjoints reaching it are discarded.
    Constant,
    /// Application of a primitive.
    Primitive(Primitive),
}

/// A node in the trace.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node<T> {
    /// Unique identifier
    pub id: NodeId,
    /// The operation that produced this node
    pub op: NodeOp,
    /// Input nodes to this operation
    pub inputs: Vec<NodeId>,
    /// The value computed at this node
    pub value: T,
}

impl<T> Node<T> {
    /// Checks if this node is a leaf or a constant.
    pub fn is_leaf(&self) -> bool {
        !matches!(self.op, NodeOp::Primitive(_))
    }
}

#[derive(Debug)]
struct TraceInner<T> {
    nodes: RefCell<Vec<Node<T>>>,
    next_id: Cell<usize>,
    track_gradients: bool,
    sealed: Cell<bool>,
}

/// Recording context for one forward evaluation.
///
/// A trace is owned by a single evaluation call and is never shared across
/// threads; it is `!Send` because tracked values hold a reference to it.
#[derive(Debug)]
pub struct Trace<T> {
    inner: Rc<TraceInner<T>>,
}

impl<T: Scalar> Trace<T> {
    /// Creates a new empty trace.
    pub fn new() -> Self {
        Self::with_tracking(true)
    }

    /// Creates a trace that computes values without recording nodes.
    pub fn no_grad() -> Self {
        Self::with_tracking(false)
    }

    fn with_tracking(track_gradients: bool) -> Self {
        Self {
            inner: Rc::new(TraceInner {
                nodes: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                track_gradients,
                sealed: Cell::new(false),
            }),
        }
    }

    /// Whether this trace records nodes.
    pub fn tracks_gradients(&self) -> bool {
        self.inner.track_gradients
    }

    /// Creates a new differentiation input.
    ///
    /// NaN and infinite inputs are rejected with a `Domain` error.
    pub fn leaf(&self, value: T) -> Result<Tracked<T>> {
        check_finite("leaf", value)?;
        self.inner.push(NodeOp::Leaf, Vec::new(), value).map(|id| Tracked {
            trace: Rc::clone(&self.inner),
            id,
            value,
        })
    }

    /// Creates a constant (non-differentiable) value.
    pub fn constant(&self, value: T) -> Result<Tracked<T>> {
        constant_on(&self.inner, value)
    }

    /// Applies a primitive to tracked operands.
    pub fn apply(&self, op: Primitive, operands: &[&Tracked<T>]) -> Result<Tracked<T>> {
        apply_on(&self.inner, op, operands)
    }

    /// Returns the number of recorded nodes.
    pub fn len(&self) -> usize {
        self.inner.nodes.borrow().len()
    }

    /// Checks if no node has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the recorded nodes.
    pub fn nodes(&self) -> Vec<Node<T>> {
        self.inner.nodes.borrow().clone()
    }

    /// Checks whether a tracked value was recorded on this trace.
    pub fn owns(&self, value: &Tracked<T>) -> bool {
        Rc::ptr_eq(&self.inner, &value.trace)
    }

    /// Seals the trace and hands its nodes over as a [`Tape`].
    ///
    /// Tracked values that outlive this call can still be read, but any
    /// further operation on them fails.
    pub fn finish(self) -> Tape<T> {
        self.inner.sealed.set(true);
        let nodes = self.inner.nodes.take();
        debug!("Trace finished with {} node(s)", nodes.len());
        Tape { nodes }
    }
}

impl<T: Scalar> Default for Trace<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> TraceInner<T> {
    fn push(&self, op: NodeOp, inputs: Vec<NodeId>, value: T) -> Result<NodeId> {
        if self.sealed.get() {
            let name = match op {
                NodeOp::Primitive(p) => p.name(),
                NodeOp::Leaf => "leaf",
                NodeOp::Constant => "constant",
            };
            return Err(AutodiffError::unsupported(
                name,
                "the trace has already been consumed",
            ));
        }

        let id = NodeId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        if self.track_gradients {
            trace!("{} = {:?}{:?} -> {}", id, op, inputs, value);
            self.nodes.borrow_mut().push(Node {
                id,
                op,
                inputs,
                value,
            });
        }
        Ok(id)
    }
}

fn check_finite<T: Scalar>(name: &str, value: T) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AutodiffError::domain(
            name,
            format!("non-finite value {}", value),
        ))
    }
}

fn constant_on<T: Scalar>(inner: &Rc<TraceInner<T>>, value: T) -> Result<Tracked<T>> {
    check_finite("constant", value)?;
    inner.push(NodeOp::Constant, Vec::new(), value).map(|id| Tracked {
        trace: Rc::clone(inner),
        id,
        value,
    })
}

fn apply_on<T: Scalar>(
    inner: &Rc<TraceInner<T>>,
    op: Primitive,
    operands: &[&Tracked<T>],
) -> Result<Tracked<T>> {
    op.check_arity(operands.len())?;
    if let Some(foreign) = operands.iter().find(|v| !Rc::ptr_eq(&v.trace, inner)) {
        return Err(AutodiffError::unsupported(
            op.name(),
            format!("operand {} belongs to a different trace", foreign.id),
        ));
    }

    let values: Vec<T> = operands.iter().map(|v| v.value).collect();
    let value = op.forward(&values)?;
    let inputs = operands.iter().map(|v| v.id).collect();
    let id = inner.push(NodeOp::Primitive(op), inputs, value)?;

    Ok(Tracked {
        trace: Rc::clone(inner),
        id,
        value,
    })
}

/// A sealed, immutable trace ready for the backward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Tape<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Tape<T> {
    /// Returns the recorded nodes in creation order.
    pub fn nodes(&self) -> &[Node<T>] {
        &self.nodes
    }

    /// Gets a node by its ID.
    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(id.0)
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Checks if the tape is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A scalar value tracked by a trace.
///
/// Every operation returns a new value and appends a node to the trace;
/// tracked values are never mutated. Branching on [`Tracked::value`] is
/// allowed but only the branch taken is recorded, so the gradient reflects
/// that branch alone.
#[derive(Clone)]
pub struct Tracked<T> {
    trace: Rc<TraceInner<T>>,
    id: NodeId,
    value: T,
}

impl<T: Scalar> Tracked<T> {
    /// The forward value.
    pub fn value(&self) -> T {
        self.value
    }

    /// The node this value refers to.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Creates a constant on the same trace.
    pub fn constant(&self, value: T) -> Result<Self> {
        constant_on(&self.trace, value)
    }

    /// Applies a primitive with `self` as the first operand.
    pub fn apply(&self, op: Primitive, rest: &[&Self]) -> Result<Self> {
        let mut operands = Vec::with_capacity(rest.len() + 1);
        operands.push(self);
        operands.extend_from_slice(rest);
        apply_on(&self.trace, op, &operands)
    }

    /// Applies a primitive looked up by name.
    pub fn call(&self, name: &str, rest: &[&Self]) -> Result<Self> {
        self.apply(Primitive::from_name(name)?, rest)
    }

    fn unary(&self, op: Primitive) -> Result<Self> {
        apply_on(&self.trace, op, &[self])
    }

    fn binary(&self, op: Primitive, rhs: &Self) -> Result<Self> {
        apply_on(&self.trace, op, &[self, rhs])
    }

    fn binary_scalar(&self, op: Primitive, rhs: T) -> Result<Self> {
        let rhs = self.constant(rhs)?;
        self.binary(op, &rhs)
    }

    /// `self + rhs`
    pub fn add(&self, rhs: &Self) -> Result<Self> {
        self.binary(Primitive::Add, rhs)
    }

    /// `self - rhs`
    pub fn sub(&self, rhs: &Self) -> Result<Self> {
        self.binary(Primitive::Sub, rhs)
    }

    /// `self * rhs`
    pub fn mul(&self, rhs: &Self) -> Result<Self> {
        self.binary(Primitive::Mul, rhs)
    }

    /// `self / rhs`
    pub fn div(&self, rhs: &Self) -> Result<Self> {
        self.binary(Primitive::Div, rhs)
    }

    /// `self + c` for a constant `c`
    pub fn add_scalar(&self, c: T) -> Result<Self> {
        self.binary_scalar(Primitive::Add, c)
    }

    /// `self - c` for a constant `c`
    pub fn sub_scalar(&self, c: T) -> Result<Self> {
        self.binary_scalar(Primitive::Sub, c)
    }

    /// `self * c` for a constant `c`
    pub fn mul_scalar(&self, c: T) -> Result<Self> {
        self.binary_scalar(Primitive::Mul, c)
    }

    /// `self / c` for a constant `c`
    pub fn div_scalar(&self, c: T) -> Result<Self> {
        self.binary_scalar(Primitive::Div, c)
    }

    /// `c / self` for a constant `c`
    pub fn recip_scaled(&self, c: T) -> Result<Self> {
        let numerator = self.constant(c)?;
        numerator.div(self)
    }

    /// `self^n` for a constant exponent
    pub fn powf(&self, n: f64) -> Result<Self> {
        self.unary(Primitive::Pow { exponent: n })
    }

    /// `self^n` for a constant integer exponent
    pub fn powi(&self, n: i32) -> Result<Self> {
        self.powf(f64::from(n))
    }

    /// `e^self`
    pub fn exp(&self) -> Result<Self> {
        self.unary(Primitive::Exp)
    }

    /// `ln(self)`
    pub fn ln(&self) -> Result<Self> {
        self.unary(Primitive::Log)
    }

    /// `sin(self)`
    pub fn sin(&self) -> Result<Self> {
        self.unary(Primitive::Sin)
    }

    /// `cos(self)`
    pub fn cos(&self) -> Result<Self> {
        self.unary(Primitive::Cos)
    }

    /// `|self|`
    pub fn abs(&self) -> Result<Self> {
        self.unary(Primitive::Abs)
    }

    /// `-self`
    pub fn neg(&self) -> Result<Self> {
        self.unary(Primitive::Neg)
    }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("id", &self.id)
            .field("value", &self.value)
            .finish()
    }
}
