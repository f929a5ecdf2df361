use std::sync::mpsc;
use std::time::Duration;

use grammar_arcade::config::{ArcadeConfig, GameKind};
use grammar_arcade::games::{build_machine, PhraseTyping, VerbLab};
use grammar_arcade::round::{Outcome, PlayerInput, RoundEvent, RoundState};
use grammar_arcade::runtime::{
    ArcadeEvent, ChannelEventSource, FixedTicker, MonotonicTime, Runner, Ticker,
};
use grammar_arcade::session::Session;

// Headless integration using the runtime + a round machine without a shell
// Verifies that a typing round completes via Runner/ChannelEventSource.
#[test]
fn headless_typing_flow_completes() {
    let config = ArcadeConfig::default();
    let mut machine = build_machine(
        GameKind::PhraseTyping,
        PhraseTyping::new(),
        &config,
        Session::seeded(10).unwrap(),
        MonotonicTime::new(),
    );
    machine.start();
    let prompt = machine.active_content().unwrap().prompt.clone();

    // Channel for the event source
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    assert_eq!(FixedTicker::for_config(&config).interval(), Duration::from_millis(100));

    // Producer: send the keystrokes for the prompt
    for c in prompt.chars() {
        tx.send(ArcadeEvent::Input(PlayerInput::Char(c))).unwrap();
    }

    // Act: drive a tiny event loop until the round ends (or bounded steps)
    for _ in 0..1000u32 {
        runner.drive(&mut machine);
        if machine.state() == RoundState::Evaluating {
            break;
        }
    }

    assert_eq!(machine.state(), RoundState::Evaluating);
    assert!(machine.score() >= 100);
    assert_eq!(machine.streak(), 1);
    let events = machine.drain_events();
    let correct = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                RoundEvent::ItemEvaluated {
                    outcome: Outcome::Correct,
                    ..
                }
            )
        })
        .count();
    assert_eq!(correct, prompt.chars().count());
}

#[test]
fn headless_mistakes_do_not_advance() {
    let config = ArcadeConfig::default();
    let mut machine = build_machine(
        GameKind::PhraseTyping,
        PhraseTyping::new(),
        &config,
        Session::seeded(11).unwrap(),
        MonotonicTime::new(),
    );
    machine.start();
    let prompt: Vec<char> = machine.active_content().unwrap().prompt.chars().collect();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(ChannelEventSource::new(rx), FixedTicker::from_millis(5));

    tx.send(ArcadeEvent::Input(PlayerInput::Char(prompt[0]))).unwrap();
    tx.send(ArcadeEvent::Input(PlayerInput::Char('#'))).unwrap();
    tx.send(ArcadeEvent::Input(PlayerInput::Char('#'))).unwrap();
    tx.send(ArcadeEvent::Input(PlayerInput::Char(prompt[1]))).unwrap();
    drop(tx);

    for _ in 0..4 {
        machine.handle(runner.step());
    }

    assert_eq!(machine.content().cursor_pos(), 2);
    assert_eq!(machine.state(), RoundState::Playing);
    let pattern = machine.active_content().unwrap().pattern_id.clone().unwrap();
    assert_eq!(machine.session().stats().error_count(&pattern), 2);
}

#[test]
fn headless_verb_lab_pick_then_stop() {
    let config = ArcadeConfig::default();
    let mut machine = build_machine(
        GameKind::VerbLab,
        VerbLab::builtin().unwrap(),
        &config,
        Session::seeded(12).unwrap(),
        MonotonicTime::new(),
    );

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(ChannelEventSource::new(rx), FixedTicker::from_millis(5));

    tx.send(ArcadeEvent::Start).unwrap();
    assert_eq!(runner.drive(&mut machine), ArcadeEvent::Start);
    let answer = machine.content().question().unwrap().answer;

    tx.send(ArcadeEvent::Input(PlayerInput::Pick(answer))).unwrap();
    tx.send(ArcadeEvent::Stop).unwrap();
    // late input after stop must be ignored
    tx.send(ArcadeEvent::Input(PlayerInput::Pick(answer))).unwrap();
    for _ in 0..3 {
        machine.handle(runner.step());
    }

    assert_eq!(machine.state(), RoundState::Idle);
    assert_eq!(machine.streak(), 1);
    assert!(machine.score() >= 80);
}
