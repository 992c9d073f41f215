use std::fmt;
use std::time::Duration;

use crate::graph::Graph;
use crate::util::Timer;

use super::task::{LayoutTask, StopStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayoutId(u64);

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ActiveLayout<T> {
    id: LayoutId,
    name: String,
    task: LayoutTask,
    timer: Timer,
    pending: T,
}

/// A computation that has stopped, together with the work its owner still
/// has to do for it.
pub(super) struct Finished<T> {
    pub(super) id: LayoutId,
    pub(super) name: String,
    pub(super) status: StopStatus,
    pub(super) iterations: usize,
    pub(super) elapsed: Duration,
    pub(super) pending: T,
}

/// Owns the single active layout computation.
pub(super) struct LayoutScheduler<T> {
    active: Option<ActiveLayout<T>>,
    next_id: u64,
}

impl<T> LayoutScheduler<T> {
    pub(super) fn new() -> Self {
        Self {
            active: None,
            next_id: 1,
        }
    }

    pub(super) fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub(super) fn active_id(&self) -> Option<LayoutId> {
        self.active.as_ref().map(|active| active.id)
    }

    pub(super) fn cancel_current(&mut self) -> Option<Finished<T>> {
        let active = self.active.take()?;
        Some(Self::finish(active, StopStatus::Cancelled))
    }

    /// Cancels whatever is running and makes `task` the active computation.
    pub(super) fn start(
        &mut self,
        name: &str,
        task: LayoutTask,
        pending: T,
    ) -> (LayoutId, Option<Finished<T>>) {
        let cancelled = self.cancel_current();

        let id = LayoutId(self.next_id);
        self.next_id += 1;
        self.active = Some(ActiveLayout {
            id,
            name: name.to_owned(),
            task,
            timer: Timer::start("layout"),
            pending,
        });

        (id, cancelled)
    }

    pub(super) fn step(&mut self, graph: &mut Graph) -> Option<Finished<T>> {
        let active = self.active.as_mut()?;
        let status = active.task.advance(graph)?;
        let active = self.active.take()?;
        Some(Self::finish(active, status))
    }

    fn finish(active: ActiveLayout<T>, status: StopStatus) -> Finished<T> {
        let iterations = active.task.iterations();
        let elapsed = active
            .timer
            .stop(Some(&format!("{} {}, {status}", active.name, active.id)));

        Finished {
            id: active.id,
            name: active.name,
            status,
            iterations,
            elapsed,
            pending: active.pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeRecord;
    use crate::layout::config;

    fn graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_node(NodeRecord::new("a")).expect("unique");
        graph.add_node(NodeRecord::new("b")).expect("unique");
        graph
    }

    #[test]
    fn starting_cancels_the_previous_computation() {
        let graph = graph();
        let mut scheduler = LayoutScheduler::new();

        let (first, cancelled) =
            scheduler.start("grid", LayoutTask::new(&graph, &config::grid()), "first");
        assert!(cancelled.is_none());

        let (second, cancelled) =
            scheduler.start("grid", LayoutTask::new(&graph, &config::grid()), "second");
        let cancelled = cancelled.expect("first is cancelled");

        assert_eq!(cancelled.id, first);
        assert_eq!(cancelled.status, StopStatus::Cancelled);
        assert_eq!(cancelled.pending, "first");
        assert!(second > first);
        assert_eq!(scheduler.active_id(), Some(second));
    }

    #[test]
    fn step_reports_completion_once() {
        let mut graph = graph();
        let mut scheduler = LayoutScheduler::new();
        scheduler.start("grid", LayoutTask::new(&graph, &config::grid()), ());

        let finished = scheduler.step(&mut graph).expect("grid finishes in one step");
        assert_eq!(finished.status, StopStatus::Placed);
        assert!(!scheduler.is_active());
        assert!(scheduler.step(&mut graph).is_none());
        assert!(scheduler.cancel_current().is_none());
    }
}
