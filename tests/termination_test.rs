/*!
 * Termination Controller Tests
 * Signal sequencing of the termination protocol against a mocked kernel
 */

use mockall::predicate::eq;
use mockall::{mock, Sequence};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use pretty_assertions::assert_eq;
use procman::process::{
    Liveness, ProcessControl, SignalError, SpawnedProcess, SpawnedThread, TerminationOutcome,
    TerminationPolicy, Terminator, WorkPlan,
};
use procman::Pid;
use std::time::{Duration, Instant};

mock! {
    pub Control {}

    impl ProcessControl for Control {
        fn spawn_process(&self, work: WorkPlan) -> procman::Result<SpawnedProcess>;
        fn spawn_thread(&self, work: WorkPlan) -> procman::Result<SpawnedThread>;
        fn send_signal(&self, pid: Pid, signal: Signal) -> Result<(), SignalError>;
        fn probe_liveness(&self, pid: Pid) -> Result<Liveness, SignalError>;
    }
}

fn policy() -> TerminationPolicy {
    TerminationPolicy::default().with_grace_period(Duration::ZERO)
}

#[test]
fn test_missing_target_after_one_send() {
    let mut control = MockControl::new();
    control
        .expect_send_signal()
        .with(eq(31337), eq(Signal::SIGTERM))
        .times(1)
        .returning(|_, _| Err(SignalError::NoSuchProcess));
    control.expect_probe_liveness().times(0);

    let outcome = Terminator::new(control, policy()).terminate(31337);
    assert_eq!(outcome, TerminationOutcome::TargetNotFound);
}

#[test]
fn test_exit_during_grace_is_graceful() {
    let mut control = MockControl::new();
    let mut seq = Sequence::new();
    control
        .expect_send_signal()
        .with(eq(500), eq(Signal::SIGTERM))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    control
        .expect_probe_liveness()
        .with(eq(500))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Liveness::Gone));

    let outcome = Terminator::new(control, policy()).terminate(500);
    assert_eq!(outcome, TerminationOutcome::ConfirmedGraceful);
    assert!(outcome.is_terminated());
}

#[test]
fn test_probe_esrch_is_graceful() {
    let mut control = MockControl::new();
    control.expect_send_signal().times(1).returning(|_, _| Ok(()));
    control
        .expect_probe_liveness()
        .times(1)
        .returning(|_| Err(SignalError::NoSuchProcess));

    let outcome = Terminator::new(control, policy()).terminate(501);
    assert_eq!(outcome, TerminationOutcome::ConfirmedGraceful);
}

#[test]
fn test_survivor_gets_exactly_one_sigkill() {
    let mut control = MockControl::new();
    control
        .expect_send_signal()
        .with(eq(600), eq(Signal::SIGTERM))
        .times(1)
        .returning(|_, _| Ok(()));
    control
        .expect_probe_liveness()
        .times(1)
        .returning(|_| Ok(Liveness::Alive));
    control
        .expect_send_signal()
        .with(eq(600), eq(Signal::SIGKILL))
        .times(1)
        .returning(|_, _| Ok(()));

    let outcome = Terminator::new(control, policy()).terminate(600);
    assert_eq!(outcome, TerminationOutcome::ConfirmedForced);
}

#[test]
fn test_sigkill_failure_reported() {
    let mut control = MockControl::new();
    control
        .expect_send_signal()
        .with(eq(601), eq(Signal::SIGTERM))
        .times(1)
        .returning(|_, _| Ok(()));
    control
        .expect_probe_liveness()
        .times(1)
        .returning(|_| Ok(Liveness::Alive));
    control
        .expect_send_signal()
        .with(eq(601), eq(Signal::SIGKILL))
        .times(1)
        .returning(|_, _| Err(SignalError::NoSuchProcess));

    match Terminator::new(control, policy()).terminate(601) {
        TerminationOutcome::SignalSendFailed { signal, .. } => assert_eq!(signal, "SIGKILL"),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn test_rejected_sigterm_retried_n_plus_one_times() {
    let mut control = MockControl::new();
    control
        .expect_send_signal()
        .with(eq(700), eq(Signal::SIGTERM))
        .times(3)
        .returning(|_, _| Err(SignalError::Rejected(Errno::EPERM)));
    control.expect_probe_liveness().times(0);

    let policy = policy().with_retries(2, Duration::ZERO);
    let outcome = Terminator::new(control, policy).terminate(700);
    assert_eq!(
        outcome,
        TerminationOutcome::SignalSendFailed {
            signal: "SIGTERM".into(),
            reason: Errno::EPERM.desc().into(),
        }
    );
}

#[test]
fn test_esrch_never_retried() {
    let mut control = MockControl::new();
    control
        .expect_send_signal()
        .times(1)
        .returning(|_, _| Err(SignalError::NoSuchProcess));

    let policy = policy().with_retries(5, Duration::ZERO);
    let outcome = Terminator::new(control, policy).terminate(701);
    assert_eq!(outcome, TerminationOutcome::TargetNotFound);
}

#[test]
fn test_retry_recovers() {
    let mut control = MockControl::new();
    let mut seq = Sequence::new();
    control
        .expect_send_signal()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(SignalError::Rejected(Errno::EAGAIN)));
    control
        .expect_send_signal()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    control
        .expect_probe_liveness()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Liveness::Gone));

    let policy = policy().with_retries(1, Duration::ZERO);
    let outcome = Terminator::new(control, policy).terminate(702);
    assert_eq!(outcome, TerminationOutcome::ConfirmedGraceful);
}

#[test]
fn test_grace_period_elapses_before_probe() {
    let mut control = MockControl::new();
    control.expect_send_signal().times(1).returning(|_, _| Ok(()));
    control
        .expect_probe_liveness()
        .times(1)
        .returning(|_| Ok(Liveness::Gone));

    let grace = Duration::from_millis(50);
    let terminator = Terminator::new(control, TerminationPolicy::default().with_grace_period(grace));
    let start = Instant::now();
    terminator.terminate(800);
    assert!(start.elapsed() >= grace);
}

#[test]
fn test_group_ids_never_signalled() {
    let mut control = MockControl::new();
    control.expect_send_signal().times(0);
    control.expect_probe_liveness().times(0);

    let terminator = Terminator::new(control, policy());
    assert_eq!(terminator.terminate(0), TerminationOutcome::TargetNotFound);
    assert_eq!(terminator.terminate(u32::MAX), TerminationOutcome::TargetNotFound);
}

#[test]
fn test_outcome_maps_to_error() {
    assert_eq!(
        TerminationOutcome::TargetNotFound.into_error(9),
        Some(procman::ProcError::TargetNotFound(9))
    );
    assert_eq!(TerminationOutcome::ConfirmedForced.into_error(9), None);
}
