//! Backward pass implementation for automatic differentiation.
//!
//! This module implements the adjoint propagation that turns a sealed
//! [`Tape`] into the derivative of its output with respect to every node.

use crate::trace::{NodeId, NodeOp, Tape};
use adjoint_core::{AutodiffError, Disconnected, EngineConfig, Result, Scalar};
use log::debug;

/// Adjoints accumulated by one backward pass.
///
/// Dense storage indexed by node, with default-zero semantics. A node is
/// *reached* when at least one path from the output leads to it.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjointMap<T> {
    adjoints: Vec<T>,
    reached: Vec<bool>,
}

impl<T: Scalar> AdjointMap<T> {
    fn zeros(len: usize) -> Self {
        Self {
            adjoints: vec![T::zero(); len],
            reached: vec![false; len],
        }
    }

    /// The adjoint of a node (zero if never reached).
    pub fn get(&self, id: NodeId) -> T {
        self.adjoints.get(id.index()).copied().unwrap_or_else(T::zero)
    }

    /// Whether any path from the output reaches the node.
    pub fn reached(&self, id: NodeId) -> bool {
        self.reached.get(id.index()).copied().unwrap_or(false)
    }

    /// Number of nodes reached by the backward pass.
    pub fn num_reached(&self) -> usize {
        self.reached.iter().filter(|&&r| r).count()
    }

    /// The gradient of the output with respect to an input, applying the
    /// configured policy for inputs that never reached the output.
    pub fn gradient(&self, input: NodeId, config: &EngineConfig) -> Result<T> {
        if self.reached(input) {
            return Ok(self.get(input));
        }
        match config.disconnected {
            Disconnected::Zero => Ok(T::zero()),
            Disconnected::Error => Err(AutodiffError::DisconnectedInput),
        }
    }
}

/// Performs the backward pass through a tape.
///
/// # Arguments
/// * `tape` - The sealed trace
/// * `output` - The node to differentiate, seeded with adjoint 1
/// * `config` - Conventions for ambiguous derivatives
///
/// # Returns
/// The adjoint of every node with respect to `output`
///
/// Nodes are visited in strict reverse creation order, which is a reverse
/// topological order because inputs always precede the nodes using them.
/// Only reached nodes evaluate their derivative rules, so an undefined
/// derivative on a branch that does not influence the output is harmless.
pub fn backward<T: Scalar>(
    tape: &Tape<T>,
    output: NodeId,
    config: &EngineConfig,
) -> Result<AdjointMap<T>> {
    if tape.get(output).is_none() {
        return Err(AutodiffError::unsupported(
            "backward",
            format!("{} is not on the tape ({} nodes)", output, tape.len()),
        ));
    }

    let nodes = tape.nodes();
    let mut adjoints = AdjointMap::zeros(nodes.len());
    adjoints.adjoints[output.index()] = T::one();
    adjoints.reached[output.index()] = true;

    for node in nodes[..=output.index()].iter().rev() {
        let index = node.id.index();
        if !adjoints.reached[index] {
            continue;
        }

        let op = match node.op {
            NodeOp::Primitive(op) => op,
            NodeOp::Leaf | NodeOp::Constant => continue,
        };

        let input_values: Vec<T> = node
            .inputs
            .iter()
            .map(|input| nodes[input.index()].value)
            .collect();
        let partials = op.local_gradients(&input_values, node.value, config)?;
        if let Some(partial) = partials.iter().find(|p| !p.is_finite()) {
            return Err(AutodiffError::domain(
                op.name(),
                format!(
                    "non-finite local derivative {} at inputs {:?}",
                    partial, input_values
                ),
            ));
        }

        let node_adjoint = adjoints.adjoints[index];
        for (input, partial) in node.inputs.iter().zip(partials) {
            // Total derivative: contributions from every consumer are summed
            let slot = &mut adjoints.adjoints[input.index()];
            *slot = *slot + node_adjoint * partial;
            if !slot.is_finite() {
                return Err(AutodiffError::domain(
                    op.name(),
                    format!("adjoint of {} overflowed to {}", input, slot),
                ));
            }
            adjoints.reached[input.index()] = true;
        }
    }

    debug!(
        "Backward pass from {} reached {} of {} node(s)",
        output,
        adjoints.num_reached(),
        nodes.len()
    );
    Ok(adjoints)
}
