//! Dispatch-and-poll controller.
//!
//! Drives one invocation through
//! `NotDispatched -> Dispatched -> Uncorrelated -> Correlated(status) -> Terminal`:
//!
//! 1. Capture the [`DispatchMoment`] and (unless disabled) fire the dispatch.
//! 2. Loop: pause for one interval, then either search the run listing for the
//!    dispatched run or refresh the run already found.
//! 3. After every poll, [`decide`] whether to continue or exit with a
//!    [`Verdict`].
//!
//! The platform never tells us which run our dispatch created. Correlation
//! picks the first listed run that started at or after the dispatch moment,
//! which can pick the wrong run when the same workflow is dispatched on the
//! same ref by someone else within one interval, or when the local clock is
//! ahead of the platform's.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::{Clock, SystemClock, TriggerEvent, WorkflowClient};
use crate::errors::{ClientOperation, WatchError};
use crate::{DispatchRequest, RunConclusion, Timestamp, WatchSettings, WorkflowRun};

// ---------------------------------------------------------------------------
// Dispatch moment
// ---------------------------------------------------------------------------

/// The single fixed instant all correlation and timeout arithmetic is
/// relative to. Captured once, immediately before the dispatch call.
#[derive(Debug, Clone, Copy)]
pub struct DispatchMoment {
    at: Timestamp,
    started: Instant,
}

impl DispatchMoment {
    /// Reads `clock` for the wall time and the runtime for the monotonic time.
    pub fn capture(clock: &dyn Clock) -> Self {
        Self {
            at: clock.now(),
            started: Instant::now(),
        }
    }

    /// Wall-clock time compared against each run's start time.
    pub fn at(&self) -> Timestamp {
        self.at
    }

    /// Monotonic time spent since capture.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

// ---------------------------------------------------------------------------
// Candidate run
// ---------------------------------------------------------------------------

/// The run being watched.
///
/// Starts [`CandidateRun::Unresolved`], becomes [`CandidateRun::Resolved`] at
/// most once, and is never cleared afterwards. Only [`CandidateRun::advance`]
/// moves it between states.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CandidateRun {
    /// No run has been correlated with the dispatch yet.
    #[default]
    Unresolved,
    /// The correlated run, as of the most recent poll.
    Resolved(WorkflowRun),
}

/// What one poll returned.
#[derive(Debug, Clone)]
pub enum Observation {
    /// A run listing (searched while unresolved).
    Listed(Vec<WorkflowRun>),
    /// A fresh copy of the resolved run.
    Refreshed(WorkflowRun),
}

impl CandidateRun {
    /// Returns the correlated run, if any.
    pub fn run(&self) -> Option<&WorkflowRun> {
        match self {
            Self::Unresolved => None,
            Self::Resolved(run) => Some(run),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Applies one poll result.
    ///
    /// A listing only matters while unresolved; a refresh only matters once
    /// resolved and only for the same run id.
    pub fn advance(self, observation: Observation, dispatched_at: Timestamp) -> Self {
        match (self, observation) {
            (Self::Unresolved, Observation::Listed(runs)) => correlate(&runs, dispatched_at)
                .cloned()
                .map_or(Self::Unresolved, Self::Resolved),
            (Self::Resolved(current), Observation::Refreshed(fresh)) => {
                if fresh.id == current.id {
                    Self::Resolved(fresh)
                } else {
                    warn!(
                        expected = %current.id,
                        received = %fresh.id,
                        "Ignoring refresh for a different run"
                    );
                    Self::Resolved(current)
                }
            }
            (state, _) => state,
        }
    }
}

/// Picks the first run, in the order given, that started at or after
/// `dispatched_at`. Runs without a start time never match.
pub fn correlate(runs: &[WorkflowRun], dispatched_at: Timestamp) -> Option<&WorkflowRun> {
    runs.iter().find(|run| {
        run.run_started_at
            .is_some_and(|started| started >= dispatched_at)
    })
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Final outcome of an invocation, computed once at loop exit.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The budget ran out before any run could be correlated.
    TimedOutNoRun { timeout: Duration },
    /// A run was correlated but had not completed when the budget ran out.
    TimedOutIncomplete { run: WorkflowRun, timeout: Duration },
    /// The correlated run completed; its conclusion decides success.
    Completed { run: WorkflowRun },
}

impl Verdict {
    /// The last known run record, if one was ever correlated.
    pub fn run(&self) -> Option<&WorkflowRun> {
        match self {
            Self::TimedOutNoRun { .. } => None,
            Self::TimedOutIncomplete { run, .. } | Self::Completed { run } => Some(run),
        }
    }

    /// Every failure that applies, in reporting order.
    ///
    /// An incomplete run and a failing conclusion are checked independently,
    /// so both may be reported for the same exit.
    pub fn failures(&self) -> Vec<WatchError> {
        let mut failures = Vec::new();
        match self {
            Self::TimedOutNoRun { timeout } => {
                failures.push(WatchError::CorrelationTimeout { timeout: *timeout });
            }
            Self::TimedOutIncomplete { run, timeout } => {
                failures.push(WatchError::CompletionTimeout {
                    timeout: *timeout,
                    run_id: run.id,
                    html_url: run.html_url.clone(),
                });
            }
            Self::Completed { .. } => {}
        }
        if let Some(run) = self.run() {
            if run.conclusion == Some(RunConclusion::Failure) {
                failures.push(WatchError::WatchedRunFailed {
                    run_id: run.id,
                    html_url: run.html_url.clone(),
                });
            }
        }
        failures
    }

    pub fn is_success(&self) -> bool {
        self.failures().is_empty()
    }

    /// Collapses the verdict to the run record or the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first entry of [`Verdict::failures`] when there is one.
    pub fn into_result(self) -> Result<WorkflowRun, WatchError> {
        if let Some(first) = self.failures().into_iter().next() {
            return Err(first);
        }
        match self {
            Self::Completed { run } | Self::TimedOutIncomplete { run, .. } => Ok(run),
            Self::TimedOutNoRun { timeout } => Err(WatchError::CorrelationTimeout { timeout }),
        }
    }
}

// ---------------------------------------------------------------------------
// Step function
// ---------------------------------------------------------------------------

/// Whether the poll loop goes round again.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Continue,
    Exit(Verdict),
}

/// Decides the next step from the elapsed time and the current candidate.
///
/// A completed run exits regardless of time; otherwise the loop exits once
/// `elapsed` reaches `timeout`.
pub fn decide(elapsed: Duration, timeout: Duration, candidate: &CandidateRun) -> Step {
    match candidate {
        CandidateRun::Resolved(run) if run.status.is_terminal() => {
            Step::Exit(Verdict::Completed { run: run.clone() })
        }
        _ if elapsed < timeout => Step::Continue,
        CandidateRun::Unresolved => Step::Exit(Verdict::TimedOutNoRun { timeout }),
        CandidateRun::Resolved(run) => Step::Exit(Verdict::TimedOutIncomplete {
            run: run.clone(),
            timeout,
        }),
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Triggers a workflow and blocks until the resulting run finishes or the
/// budget runs out.
pub struct DispatchController {
    client: Arc<dyn WorkflowClient>,
    clock: Arc<dyn Clock>,
    settings: WatchSettings,
}

impl DispatchController {
    /// Creates a controller that reads wall time from the system clock.
    pub fn new(client: Arc<dyn WorkflowClient>, settings: WatchSettings) -> Self {
        Self {
            client,
            clock: Arc::new(SystemClock),
            settings,
        }
    }

    /// Replaces the wall-clock source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Runs one dispatch-and-watch invocation to its verdict.
    ///
    /// Exactly one pause precedes every poll, so at most one remote call is
    /// made per interval.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Transport`] as soon as any remote call fails.
    /// Timeouts and failed runs are not errors here; they are reported by the
    /// returned [`Verdict`].
    pub async fn run(&self, request: &DispatchRequest) -> Result<Verdict, WatchError> {
        let moment = self.begin(request).await?;
        let mut candidate = CandidateRun::Unresolved;

        loop {
            self.settings.interval().wait().await;
            candidate = self.poll(request, &moment, candidate).await?;

            if let Step::Exit(verdict) =
                decide(moment.elapsed(), self.settings.timeout(), &candidate)
            {
                debug!(elapsed = ?moment.elapsed(), "Poll loop finished");
                return Ok(verdict);
            }
        }
    }

    async fn begin(&self, request: &DispatchRequest) -> Result<DispatchMoment, WatchError> {
        let moment = DispatchMoment::capture(self.clock.as_ref());

        if self.settings.trigger_workflow() {
            info!(target_workflow = %request, dispatched_at = %moment.at(), "Dispatching workflow");
            self.client
                .dispatch(request)
                .await
                .map_err(WatchError::transport(ClientOperation::Dispatch))?;
        } else {
            info!(
                target_workflow = %request,
                "Dispatch disabled; watching for a run started after {}",
                moment.at()
            );
        }

        Ok(moment)
    }

    async fn poll(
        &self,
        request: &DispatchRequest,
        moment: &DispatchMoment,
        candidate: CandidateRun,
    ) -> Result<CandidateRun, WatchError> {
        let observation = match &candidate {
            CandidateRun::Unresolved => {
                let runs = self
                    .client
                    .list_runs(request, TriggerEvent::WorkflowDispatch)
                    .await
                    .map_err(WatchError::transport(ClientOperation::ListRuns))?;
                debug!(listed = runs.len(), "Searching for related workflow run");
                Observation::Listed(runs)
            }
            CandidateRun::Resolved(run) => {
                let fresh = self
                    .client
                    .get_run(&request.owner, &request.repository, run.id)
                    .await
                    .map_err(WatchError::transport(ClientOperation::GetRun))?;
                Observation::Refreshed(fresh)
            }
        };

        let was_resolved = candidate.is_resolved();
        let next = candidate.advance(observation, moment.at());

        if let Some(run) = next.run() {
            if was_resolved {
                let conclusion = run
                    .conclusion
                    .map_or_else(|| "none".to_string(), |c| c.to_string());
                info!(
                    run_id = %run.id,
                    status = %run.status,
                    conclusion = %conclusion,
                    "Workflow run status refreshed"
                );
            } else {
                info!(
                    run_id = %run.id,
                    "Related workflow run found. See {} for details.",
                    run.html_url
                );
            }
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::errors::ClientError;
    use crate::{Owner, RepositoryName, RunId, RunStatus};

    // -----------------------------------------------------------------------
    // Fixtures
    // -----------------------------------------------------------------------

    fn t0() -> Timestamp {
        let dt: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        Timestamp::from_utc(dt)
    }

    fn at_offset(secs: i64) -> Timestamp {
        Timestamp::from_utc(t0().as_datetime() + chrono::Duration::seconds(secs))
    }

    fn run(
        id: u64,
        started_offset: Option<i64>,
        status: RunStatus,
        conclusion: Option<RunConclusion>,
    ) -> WorkflowRun {
        WorkflowRun {
            id: RunId::new(id),
            run_number: id,
            html_url: format!("https://github.com/octo/hello/actions/runs/{id}"),
            status,
            conclusion,
            run_started_at: started_offset.map(at_offset),
        }
    }

    fn request() -> DispatchRequest {
        DispatchRequest::new("octo", "hello", "deploy.yml", "main").unwrap()
    }

    struct FixedClock(Timestamp);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            self.0
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Dispatch,
        List,
        Get(RunId),
    }

    /// Replays scripted responses; the last entry of each script repeats.
    #[derive(Default)]
    struct ScriptedClient {
        dispatch_error: Option<ClientError>,
        list: Mutex<VecDeque<Result<Vec<WorkflowRun>, ClientError>>>,
        get: Mutex<VecDeque<Result<WorkflowRun, ClientError>>>,
        calls: Mutex<Vec<(Call, Instant)>>,
    }

    impl ScriptedClient {
        fn new(
            list: Vec<Result<Vec<WorkflowRun>, ClientError>>,
            get: Vec<Result<WorkflowRun, ClientError>>,
        ) -> Self {
            Self {
                list: Mutex::new(list.into()),
                get: Mutex::new(get.into()),
                ..Self::default()
            }
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push((call, Instant::now()));
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
        }

        fn call_instants(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
        }

        fn next<T: Clone>(script: &Mutex<VecDeque<T>>) -> T {
            let mut script = script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().expect("script exhausted")
            }
        }
    }

    #[async_trait]
    impl WorkflowClient for ScriptedClient {
        async fn dispatch(&self, _request: &DispatchRequest) -> Result<(), ClientError> {
            self.record(Call::Dispatch);
            match &self.dispatch_error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        async fn list_runs(
            &self,
            _request: &DispatchRequest,
            event: TriggerEvent,
        ) -> Result<Vec<WorkflowRun>, ClientError> {
            assert_eq!(event, TriggerEvent::WorkflowDispatch);
            self.record(Call::List);
            Self::next(&self.list)
        }

        async fn get_run(
            &self,
            _owner: &Owner,
            _repository: &RepositoryName,
            run_id: RunId,
        ) -> Result<WorkflowRun, ClientError> {
            self.record(Call::Get(run_id));
            Self::next(&self.get)
        }
    }

    fn controller(
        client: &Arc<ScriptedClient>,
        interval: f64,
        timeout: f64,
        trigger: bool,
    ) -> DispatchController {
        let settings = WatchSettings::new(interval, timeout, trigger).unwrap();
        DispatchController::new(client.clone(), settings).with_clock(Arc::new(FixedClock(t0())))
    }

    // -----------------------------------------------------------------------
    // Correlation
    // -----------------------------------------------------------------------

    #[test]
    fn correlate_never_selects_runs_started_before_dispatch() {
        let older = run(1, Some(-30), RunStatus::Completed, Some(RunConclusion::Success));
        let just_before = run(2, Some(-1), RunStatus::InProgress, None);
        let ours = run(3, Some(4), RunStatus::Queued, None);
        let runs = [older, just_before, ours];

        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let listed: Vec<WorkflowRun> = order.iter().map(|&i| runs[i].clone()).collect();
            let picked = correlate(&listed, t0()).map(|r| r.id);
            assert_eq!(picked, Some(RunId::new(3)), "order {order:?}");
        }
    }

    #[test]
    fn correlate_takes_first_match_in_listed_order() {
        let newer = run(11, Some(8), RunStatus::Queued, None);
        let ours = run(10, Some(2), RunStatus::InProgress, None);
        let listed = vec![newer, ours];

        assert_eq!(correlate(&listed, t0()).map(|r| r.id), Some(RunId::new(11)));
    }

    #[test]
    fn correlate_accepts_exact_dispatch_moment_and_skips_unstarted_runs() {
        let unstarted = run(20, None, RunStatus::Queued, None);
        let exact = run(21, Some(0), RunStatus::Queued, None);

        assert_eq!(
            correlate(&[unstarted.clone(), exact], t0()).map(|r| r.id),
            Some(RunId::new(21))
        );
        assert!(correlate(&[unstarted], t0()).is_none());
    }

    #[test]
    fn resolved_candidate_is_never_cleared() {
        let ours = run(5, Some(1), RunStatus::InProgress, None);
        let candidate = CandidateRun::Resolved(ours.clone());

        let after_empty_listing = candidate.advance(Observation::Listed(Vec::new()), t0());
        assert_eq!(after_empty_listing, CandidateRun::Resolved(ours.clone()));

        let stranger = run(99, Some(1), RunStatus::Completed, Some(RunConclusion::Success));
        let after_stray_refresh =
            after_empty_listing.advance(Observation::Refreshed(stranger), t0());
        assert_eq!(after_stray_refresh, CandidateRun::Resolved(ours));
    }

    #[test]
    fn refresh_overwrites_status_in_place() {
        let queued = run(5, Some(1), RunStatus::Queued, None);
        let done = run(5, Some(1), RunStatus::Completed, Some(RunConclusion::Success));

        let candidate = CandidateRun::Resolved(queued).advance(Observation::Refreshed(done.clone()), t0());
        assert_eq!(candidate.run(), Some(&done));
    }

    // -----------------------------------------------------------------------
    // Step function
    // -----------------------------------------------------------------------

    #[test]
    fn decide_continues_until_timeout_then_reports_missing_run() {
        let timeout = Duration::from_secs(20);
        let candidate = CandidateRun::Unresolved;

        assert_eq!(decide(Duration::from_secs(19), timeout, &candidate), Step::Continue);
        assert_eq!(
            decide(Duration::from_secs(20), timeout, &candidate),
            Step::Exit(Verdict::TimedOutNoRun { timeout })
        );
    }

    #[test]
    fn decide_exits_on_completion_even_after_timeout() {
        let timeout = Duration::from_secs(20);
        let done = run(3, Some(1), RunStatus::Completed, Some(RunConclusion::Success));
        let candidate = CandidateRun::Resolved(done.clone());

        for elapsed in [5, 20, 500] {
            assert_eq!(
                decide(Duration::from_secs(elapsed), timeout, &candidate),
                Step::Exit(Verdict::Completed { run: done.clone() })
            );
        }
    }

    #[test]
    fn decide_is_stable_across_repeated_refreshes_of_a_completed_run() {
        let timeout = Duration::from_secs(60);
        let done = run(3, Some(1), RunStatus::Completed, Some(RunConclusion::Failure));
        let first = decide(Duration::from_secs(30), timeout, &CandidateRun::Resolved(done.clone()));

        let mut candidate = CandidateRun::Resolved(done.clone());
        for _ in 0..3 {
            candidate = candidate.advance(Observation::Refreshed(done.clone()), t0());
            assert_eq!(decide(Duration::from_secs(30), timeout, &candidate), first);
        }
    }

    // -----------------------------------------------------------------------
    // Verdict
    // -----------------------------------------------------------------------

    #[test]
    fn verdict_reports_incomplete_and_failed_independently() {
        let odd = run(4, Some(1), RunStatus::InProgress, Some(RunConclusion::Failure));
        let verdict = Verdict::TimedOutIncomplete {
            run: odd,
            timeout: Duration::from_secs(30),
        };

        let failures = verdict.failures();
        assert_eq!(failures.len(), 2);
        assert!(matches!(failures[0], WatchError::CompletionTimeout { .. }));
        assert!(matches!(failures[1], WatchError::WatchedRunFailed { .. }));
    }

    #[test]
    fn non_failure_conclusions_succeed() {
        for conclusion in [RunConclusion::Success, RunConclusion::Cancelled, RunConclusion::Skipped] {
            let verdict = Verdict::Completed {
                run: run(6, Some(1), RunStatus::Completed, Some(conclusion)),
            };
            assert!(verdict.is_success(), "{conclusion}");
        }
    }

    // -----------------------------------------------------------------------
    // Controller scenarios (virtual time)
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn run_appears_then_succeeds() {
        let stale = run(1, Some(-100), RunStatus::Completed, Some(RunConclusion::Success));
        let ours = |status, conclusion| run(2, Some(15), status, conclusion);
        let client = Arc::new(ScriptedClient::new(
            vec![
                Ok(vec![stale.clone()]),
                Ok(vec![stale, ours(RunStatus::InProgress, None)]),
            ],
            vec![
                Ok(ours(RunStatus::InProgress, None)),
                Ok(ours(RunStatus::InProgress, None)),
                Ok(ours(RunStatus::Completed, Some(RunConclusion::Success))),
            ],
        ));
        let start = Instant::now();

        let verdict = controller(&client, 10.0, 60.0, true)
            .run(&request())
            .await
            .unwrap();

        assert!(verdict.failures().is_empty());
        let finished = verdict.into_result().unwrap();
        assert_eq!(finished.id, RunId::new(2));
        assert_eq!(finished.conclusion, Some(RunConclusion::Success));

        assert_eq!(
            client.calls(),
            vec![
                Call::Dispatch,
                Call::List,
                Call::List,
                Call::Get(RunId::new(2)),
                Call::Get(RunId::new(2)),
                Call::Get(RunId::new(2)),
            ]
        );

        // The dispatch is immediate; poll N is issued no earlier than N intervals in.
        let instants = client.call_instants();
        assert_eq!(instants[0], start);
        for (n, at) in instants.iter().enumerate().skip(1) {
            assert!(*at >= start + Duration::from_secs(10 * n as u64), "poll {n}");
        }
        assert!(start.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn no_matching_run_times_out_without_completion_failure() {
        let stale = run(1, Some(-1), RunStatus::InProgress, None);
        let client = Arc::new(ScriptedClient::new(vec![Ok(vec![stale])], Vec::new()));
        let start = Instant::now();

        let verdict = controller(&client, 5.0, 20.0, true)
            .run(&request())
            .await
            .unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(20) && elapsed <= Duration::from_secs(25));

        let failures = verdict.failures();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], WatchError::CorrelationTimeout { .. }));
        assert!(client
            .calls()
            .iter()
            .all(|c| matches!(c, Call::Dispatch | Call::List)));
    }

    #[tokio::test(start_paused = true)]
    async fn correlated_run_that_never_finishes_is_a_completion_timeout() {
        let ours = run(8, Some(3), RunStatus::InProgress, None);
        let client = Arc::new(ScriptedClient::new(
            vec![Ok(vec![ours.clone()])],
            vec![Ok(ours)],
        ));

        let verdict = controller(&client, 5.0, 30.0, true)
            .run(&request())
            .await
            .unwrap();

        assert!(matches!(verdict, Verdict::TimedOutIncomplete { .. }));
        let err = verdict.into_result().unwrap_err();
        assert!(matches!(err, WatchError::CompletionTimeout { run_id, .. } if run_id == RunId::new(8)));

        // Searched once, then refreshed by id only.
        let calls = client.calls();
        assert_eq!(calls.iter().filter(|c| **c == Call::List).count(), 1);
        assert!(calls[2..].iter().all(|c| *c == Call::Get(RunId::new(8))));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_reports_its_link() {
        let ours = run(12, Some(2), RunStatus::Completed, Some(RunConclusion::Failure));
        let client = Arc::new(ScriptedClient::new(vec![Ok(vec![ours])], Vec::new()));

        let verdict = controller(&client, 1.0, 30.0, true)
            .run(&request())
            .await
            .unwrap();

        let err = verdict.into_result().unwrap_err();
        assert!(matches!(err, WatchError::WatchedRunFailed { .. }));
        assert!(err
            .to_string()
            .contains("https://github.com/octo/hello/actions/runs/12"));
    }

    #[tokio::test(start_paused = true)]
    async fn skipped_dispatch_still_correlates_and_polls() {
        let ours = |status, conclusion| run(3, Some(6), status, conclusion);
        let client = Arc::new(ScriptedClient::new(
            vec![Ok(Vec::new()), Ok(vec![ours(RunStatus::Queued, None)])],
            vec![Ok(ours(RunStatus::Completed, Some(RunConclusion::Success)))],
        ));

        let verdict = controller(&client, 10.0, 60.0, false)
            .run(&request())
            .await
            .unwrap();

        assert!(verdict.is_success());
        assert_eq!(
            client.calls(),
            vec![Call::List, Call::List, Call::Get(RunId::new(3))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_aborts_the_loop() {
        let client = Arc::new(ScriptedClient::new(
            vec![
                Ok(Vec::new()),
                Err(ClientError::RateLimited { retry_after: None }),
            ],
            Vec::new(),
        ));

        let err = controller(&client, 5.0, 600.0, true)
            .run(&request())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WatchError::Transport {
                operation: ClientOperation::ListRuns,
                source: ClientError::RateLimited { .. }
            }
        ));
        assert_eq!(client.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_failure_aborts_before_polling() {
        let client = Arc::new(ScriptedClient {
            dispatch_error: Some(ClientError::Unauthorized {
                status: 401,
                message: "Bad credentials".into(),
            }),
            ..ScriptedClient::default()
        });
        let start = Instant::now();

        let err = controller(&client, 5.0, 60.0, true)
            .run(&request())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WatchError::Transport {
                operation: ClientOperation::Dispatch,
                ..
            }
        ));
        assert_eq!(client.calls(), vec![Call::Dispatch]);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_polls_exactly_once() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(Vec::new())], Vec::new()));

        let verdict = controller(&client, 2.0, 0.0, true)
            .run(&request())
            .await
            .unwrap();

        assert!(matches!(verdict, Verdict::TimedOutNoRun { .. }));
        assert_eq!(client.calls(), vec![Call::Dispatch, Call::List]);
    }
}
