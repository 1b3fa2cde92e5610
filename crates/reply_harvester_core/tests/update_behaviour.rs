mod common;

use std::time::Duration;

use common::{blob, init_logging, reply, root, run_scripted, LINK, ROOT_CODE};
use reply_harvester_core::{
    update, Effect, FailureKind, HarvestConfig, HarvestSession, Msg, Phase, StopReason,
};

#[test]
fn invalid_locator_fails_fast_without_source_calls() {
    init_logging();
    let session = HarvestSession::new("https://www.threads.net/@alice", HarvestConfig::default());

    let (session, effects) = update(session, Msg::Start);

    assert!(matches!(
        session.phase(),
        Phase::Failed(FailureKind::InvalidLocator(_))
    ));
    assert_eq!(effects, vec![Effect::Finish]);
    assert_eq!(session.iteration(), 0);
}

#[test]
fn first_iteration_waits_for_readiness_without_reveal() {
    init_logging();
    let session = HarvestSession::new(LINK, HarvestConfig::for_replies(5));

    let (session, effects) = update(session, Msg::Start);
    assert_eq!(session.root_code(), Some(ROOT_CODE));
    assert_eq!(session.iteration(), 1);
    assert_eq!(*session.phase(), Phase::Loading);
    assert_eq!(
        effects,
        vec![
            Effect::Navigate {
                url: LINK.to_string()
            },
            Effect::AwaitReadiness {
                timeout: Duration::from_secs(10)
            },
        ]
    );

    let (session, effects) = update(session, Msg::SourceReady);
    assert_eq!(*session.phase(), Phase::Scanning);
    assert_eq!(effects, vec![Effect::DrainPayloads]);

    let (session, effects) = update(
        session,
        Msg::PayloadsDrained(vec![blob(vec![vec![root(), reply(1)]])]),
    );
    assert_eq!(session.admitted().len(), 2);
    assert_eq!(session.iteration(), 2);
    assert_eq!(*session.phase(), Phase::Loading);
    assert_eq!(
        effects,
        vec![
            Effect::RevealMore,
            Effect::Settle {
                duration: Duration::from_millis(2_500)
            },
        ]
    );
}

#[test]
fn readiness_timeout_is_not_fatal() {
    init_logging();
    let (session, _) = update(
        HarvestSession::new(LINK, HarvestConfig::default()),
        Msg::Start,
    );

    let (session, effects) = update(session, Msg::ReadinessTimedOut);

    assert_eq!(*session.phase(), Phase::Scanning);
    assert_eq!(effects, vec![Effect::DrainPayloads]);
}

#[test]
fn quota_stops_the_loop_in_the_first_iteration() {
    init_logging();
    let drains = vec![vec![blob(vec![vec![
        root(),
        reply(1),
        reply(2),
        reply(3),
        reply(4),
    ]])]];

    let session = run_scripted(HarvestConfig::for_replies(2), drains);

    assert_eq!(*session.phase(), Phase::Done(StopReason::QuotaReached));
    assert_eq!(session.iteration(), 1);
    assert_eq!(session.admitted().len(), 5);
}

#[test]
fn stagnation_after_productive_first_iteration_stops_at_iteration_two() {
    init_logging();
    let drains = vec![vec![blob(vec![vec![root(), reply(1)]])], vec![], vec![]];

    let session = run_scripted(HarvestConfig::for_replies(10), drains);

    assert_eq!(*session.phase(), Phase::Done(StopReason::Stagnated));
    assert_eq!(session.iteration(), 2);
    assert_eq!(session.admitted().len(), 2);
}

#[test]
fn empty_first_drain_is_not_stagnation() {
    init_logging();
    let drains = vec![vec![], vec![blob(vec![vec![root()]])], vec![]];

    let session = run_scripted(HarvestConfig::for_replies(10), drains);

    assert_eq!(*session.phase(), Phase::Done(StopReason::Stagnated));
    assert_eq!(session.iteration(), 3);
    assert_eq!(session.admitted().len(), 1);
}

#[test]
fn source_without_data_fails_after_two_iterations() {
    init_logging();
    let session = run_scripted(HarvestConfig::for_replies(3), vec![vec![], vec![], vec![]]);

    assert_eq!(
        *session.phase(),
        Phase::Failed(FailureKind::NoDataHarvested)
    );
    assert_eq!(session.iteration(), 2);
}

#[test]
fn patience_delays_stagnation_stop() {
    init_logging();
    let config = HarvestConfig {
        stagnation_patience: 3,
        ..HarvestConfig::for_replies(10)
    };
    let drains = vec![vec![blob(vec![vec![root()]])], vec![], vec![], vec![], vec![]];

    let session = run_scripted(config, drains);

    assert_eq!(*session.phase(), Phase::Done(StopReason::Stagnated));
    assert_eq!(session.iteration(), 4);
}

#[test]
fn late_growth_resets_stagnation_streak() {
    init_logging();
    let config = HarvestConfig {
        stagnation_patience: 2,
        ..HarvestConfig::for_replies(10)
    };
    let drains = vec![
        vec![blob(vec![vec![root()]])],
        vec![],
        vec![blob(vec![vec![reply(1)]])],
        vec![],
        vec![],
    ];

    let session = run_scripted(config, drains);

    assert_eq!(*session.phase(), Phase::Done(StopReason::Stagnated));
    assert_eq!(session.iteration(), 5);
    assert_eq!(session.admitted().len(), 2);
}

#[test]
fn budget_exhaustion_keeps_partial_results() {
    init_logging();
    let config = HarvestConfig {
        max_iterations: 5,
        ..HarvestConfig::for_replies(100)
    };
    let drains = (1..=10).map(|n| vec![blob(vec![vec![reply(n)]])]).collect();

    let session = run_scripted(config, drains);

    assert_eq!(*session.phase(), Phase::Done(StopReason::BudgetExhausted));
    assert_eq!(session.iteration(), 5);
    assert_eq!(session.admitted().len(), 5);
}

#[test]
fn duplicates_in_later_drains_count_as_no_growth() {
    init_logging();
    let drains = vec![
        vec![blob(vec![vec![root(), reply(1)]])],
        vec![blob(vec![vec![reply(1)]]), blob(vec![vec![root()]])],
    ];

    let session = run_scripted(HarvestConfig::for_replies(5), drains);

    assert_eq!(*session.phase(), Phase::Done(StopReason::Stagnated));
    assert_eq!(session.admitted().len(), 2);
}

#[test]
fn cancel_keeps_partial_results_and_is_not_a_failure() {
    init_logging();
    let (session, _) = update(
        HarvestSession::new(LINK, HarvestConfig::for_replies(5)),
        Msg::Start,
    );
    let (session, _) = update(session, Msg::SourceReady);
    let (session, _) = update(
        session,
        Msg::PayloadsDrained(vec![blob(vec![vec![root(), reply(1)]])]),
    );

    let (session, effects) = update(session, Msg::CancelRequested);

    assert_eq!(*session.phase(), Phase::Done(StopReason::Cancelled));
    assert_eq!(effects, vec![Effect::Finish]);
    assert_eq!(session.admitted().len(), 2);
}

#[test]
fn cancel_before_any_data_is_still_done() {
    init_logging();
    let (session, _) = update(
        HarvestSession::new(LINK, HarvestConfig::default()),
        Msg::Start,
    );

    let (session, _) = update(session, Msg::CancelRequested);

    assert_eq!(*session.phase(), Phase::Done(StopReason::Cancelled));
    assert!(session.admitted().is_empty());
}

#[test]
fn view_reports_progress() {
    init_logging();
    let (session, _) = update(
        HarvestSession::new(LINK, HarvestConfig::for_replies(5)),
        Msg::Start,
    );
    let (session, _) = update(session, Msg::SourceReady);
    let (session, _) = update(
        session,
        Msg::PayloadsDrained(vec![
            blob(vec![vec![root(), reply(1)]]),
            "not json".to_string(),
        ]),
    );

    let view = session.view();
    assert_eq!(view.root_code.as_deref(), Some(ROOT_CODE));
    assert_eq!(view.iteration, 2);
    assert_eq!(view.admitted, 2);
    assert_eq!(view.last_new, 2);
    assert_eq!(view.scan.blobs_seen, 2);
    assert_eq!(view.scan.blobs_in_scope, 1);
}
