//! Undo and redo of graph changes.
//!
//! An [`UndoRecorder`] subscribes to a [`NodeContainer`] and turns every
//! completed change into an [`Operation`]. Undoing applies the inverse
//! operation through the node API, so listeners and references stay
//! consistent; redoing applies the operation again.
//!
//! ```
//! # use std::rc::Rc;
//! # use quantum::{NodeContainer, NodeIndex, TypeDescriptor, TypeDescriptorFactory, ValueKind, UndoRecorder};
//! let mut factory = TypeDescriptorFactory::new();
//! factory.register(TypeDescriptor::list("List<int>", ValueKind::Int)).unwrap();
//! let list = factory.new_collection("List<int>", vec![]).unwrap();
//!
//! let graph = NodeContainer::new();
//! let recorder = Rc::new(UndoRecorder::new(16));
//! graph.subscribe(recorder.clone());
//!
//! let node = graph.get_or_create_node(&list).unwrap();
//! graph.add(node, 7).unwrap();
//! assert!(recorder.undo(&graph).unwrap());
//! assert!(list.is_empty());
//! assert!(recorder.redo(&graph).unwrap());
//! assert_eq!(list.len(), 1);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, warn};

use crate::Result;
use crate::config::ContainerConfig;
use crate::descriptor::DescriptorCategory;
use crate::graph::{ChangeListener, ChangeType, NodeChangeEvent, NodeContainer, NodeHandle, NodeIndex};
use crate::value::Value;

pub mod errors;

pub use errors::HistoryError;

/// One recorded change.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// The changed node
    pub node: NodeHandle,
    /// The changed item; empty for member replacements
    pub index: NodeIndex,
    /// Kind of change
    pub change_type: ChangeType,
    /// Value before the change
    pub old_value: Value,
    /// Value after the change
    pub new_value: Value,
}

impl Operation {
    fn from_event(event: &NodeChangeEvent) -> Self {
        Self {
            node: event.node,
            index: event.index.clone(),
            change_type: event.change_type,
            old_value: event.old_value.clone(),
            new_value: event.new_value.clone(),
        }
    }

    /// Applies the inverse of the change
    pub fn revert(&self, graph: &NodeContainer) -> Result<()> {
        match self.change_type {
            ChangeType::Add => graph.remove(self.node, self.new_value.clone(), self.index.clone()),
            ChangeType::Remove => graph.add_at(self.node, self.old_value.clone(), self.index.clone()),
            ChangeType::Update => {
                let index = self.current_index(graph, &self.new_value);
                graph.update(self.node, self.old_value.clone(), index)
            }
        }
    }

    /// Applies the change again
    pub fn apply(&self, graph: &NodeContainer) -> Result<()> {
        match self.change_type {
            ChangeType::Add => graph.add_at(self.node, self.new_value.clone(), self.index.clone()),
            ChangeType::Remove => graph.remove(self.node, self.old_value.clone(), self.index.clone()),
            ChangeType::Update => {
                let index = self.current_index(graph, &self.old_value);
                graph.update(self.node, self.new_value.clone(), index)
            }
        }
    }

    // Set items are keyed by their value, so the slot moves with each update
    fn current_index(&self, graph: &NodeContainer, present: &Value) -> NodeIndex {
        let is_set = graph
            .object(self.node)
            .is_ok_and(|object| object.descriptor().category() == DescriptorCategory::Set);
        match present.to_index_key() {
            Some(key) if is_set => NodeIndex::Key(key),
            _ => self.index.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct HistoryState {
    undo: VecDeque<Vec<Operation>>,
    redo: Vec<Vec<Operation>>,
    open: Option<Vec<Operation>>,
    depth: usize,
    replaying: bool,
}

/// Change listener recording an undo and a redo stack.
///
/// Changes made while undoing or redoing are not recorded. Any new change
/// clears the redo stack. At most `capacity` steps are kept, the oldest
/// dropped first; a capacity of 0 keeps every step.
pub struct UndoRecorder {
    state: RefCell<HistoryState>,
    capacity: usize,
}

impl UndoRecorder {
    /// Creates a recorder keeping at most `capacity` steps
    pub fn new(capacity: usize) -> Self {
        Self {
            state: RefCell::new(HistoryState::default()),
            capacity,
        }
    }

    /// Creates a recorder bounded by the configured history capacity
    pub fn from_config(config: &ContainerConfig) -> Self {
        Self::new(config.history_capacity)
    }

    /// Returns true if a step can be undone
    pub fn can_undo(&self) -> bool {
        !self.state.borrow().undo.is_empty()
    }

    /// Returns true if a step can be redone
    pub fn can_redo(&self) -> bool {
        !self.state.borrow().redo.is_empty()
    }

    /// Number of steps on the undo stack
    pub fn undo_len(&self) -> usize {
        self.state.borrow().undo.len()
    }

    /// Number of steps on the redo stack
    pub fn redo_len(&self) -> usize {
        self.state.borrow().redo.len()
    }

    /// Drops every recorded step
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.undo.clear();
        state.redo.clear();
    }

    /// Groups the following changes into one step, until the matching
    /// [`end_transaction`](Self::end_transaction). Transactions nest.
    pub fn begin_transaction(&self) {
        let mut state = self.state.borrow_mut();
        state.depth += 1;
        state.open.get_or_insert_with(Vec::new);
    }

    /// Closes the innermost transaction.
    ///
    /// Closing the outermost one records its changes as a single step.
    pub fn end_transaction(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.depth == 0 {
            return Err(HistoryError::TransactionNotOpen.into());
        }
        state.depth -= 1;
        if state.depth == 0 {
            let operations = state.open.take().unwrap_or_default();
            if !operations.is_empty() {
                Self::push_step(&mut state, operations, self.capacity);
            }
        }
        Ok(())
    }

    /// Undoes the last step. Returns false if there was nothing to undo.
    ///
    /// If an operation of the step fails, the operations already undone are
    /// applied again and the step stays on the undo stack.
    pub fn undo(&self, graph: &NodeContainer) -> Result<bool> {
        let Some(step) = self.state.borrow_mut().undo.pop_back() else {
            return Ok(false);
        };
        if let Err(err) = self.replay(graph, &step, true) {
            self.state.borrow_mut().undo.push_back(step);
            return Err(err);
        }
        debug!(operations = step.len(), "Undid history step");
        self.state.borrow_mut().redo.push(step);
        Ok(true)
    }

    /// Redoes the last undone step. Returns false if there was nothing to redo.
    ///
    /// A failed step is rolled back and stays on the redo stack.
    pub fn redo(&self, graph: &NodeContainer) -> Result<bool> {
        let Some(step) = self.state.borrow_mut().redo.pop() else {
            return Ok(false);
        };
        if let Err(err) = self.replay(graph, &step, false) {
            self.state.borrow_mut().redo.push(step);
            return Err(err);
        }
        debug!(operations = step.len(), "Redid history step");
        let mut state = self.state.borrow_mut();
        Self::push_step(&mut state, step, self.capacity);
        Ok(true)
    }

    fn replay(&self, graph: &NodeContainer, step: &[Operation], backwards: bool) -> Result<()> {
        self.state.borrow_mut().replaying = true;
        let result = Self::run(graph, step, backwards);
        self.state.borrow_mut().replaying = false;
        result.map_err(|err| {
            HistoryError::ApplyFailed {
                source: Box::new(err),
            }
            .into()
        })
    }

    /// Runs every operation of `step`; on failure, runs the completed ones
    /// in the other direction
    fn run(graph: &NodeContainer, step: &[Operation], backwards: bool) -> Result<()> {
        let ordered: Vec<&Operation> = if backwards {
            step.iter().rev().collect()
        } else {
            step.iter().collect()
        };
        let play = |operation: &Operation, backwards: bool| {
            if backwards {
                operation.revert(graph)
            } else {
                operation.apply(graph)
            }
        };
        for (done, operation) in ordered.iter().enumerate() {
            let Err(err) = play(*operation, backwards) else {
                continue;
            };
            warn!(error = %err, completed = done, "History replay failed, rolling back step");
            for operation in ordered[..done].iter().rev() {
                if let Err(rollback) = play(*operation, !backwards) {
                    warn!(error = %rollback, "Rolling back history step failed");
                }
            }
            return Err(err);
        }
        Ok(())
    }

    fn push_step(state: &mut HistoryState, step: Vec<Operation>, capacity: usize) {
        state.undo.push_back(step);
        if capacity > 0 {
            while state.undo.len() > capacity {
                state.undo.pop_front();
            }
        }
    }

    fn record(&self, event: &NodeChangeEvent) {
        let mut state = self.state.borrow_mut();
        if state.replaying {
            return;
        }
        let operation = Operation::from_event(event);
        state.redo.clear();
        if let Some(open) = state.open.as_mut() {
            open.push(operation);
            return;
        }
        Self::push_step(&mut state, vec![operation], self.capacity);
    }
}

impl fmt::Debug for UndoRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoRecorder")
            .field("undo", &self.undo_len())
            .field("redo", &self.redo_len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl ChangeListener for UndoRecorder {
    fn item_changed(&self, _graph: &NodeContainer, event: &NodeChangeEvent) {
        self.record(event);
    }

    fn value_changed(&self, _graph: &NodeContainer, event: &NodeChangeEvent) {
        self.record(event);
    }
}
