use tracing::{debug, error, info, warn};

use crate::error::{EngineError, Result};

use super::clock::{Clock, MonotonicClock};
use super::scoring::{Outcome, RoundTiming};
use super::sequence::SequenceGenerator;
use super::timer::{Mark, TimerEvent, TimerHandle, TimerKind, TimerService};
use super::variant::{Judgement, LifePolicy, Reveal, StimulusShape, VariantConfig};
use super::{Element, EndReason, FinishedPlay, GameSession, GameState, PlayerInput, ScoreSubmitter, Stimulus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundPhase {
    /// Stimulus on screen; input is not accepted yet.
    Revealing,
    /// Waiting for the go signal; any input is a false start.
    AwaitingSignal,
    Responding,
    Resolved,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundState {
    pub stimulus: Stimulus,
    pub phase: RoundPhase,
    pub matched: Vec<Element>,
    /// When the response window opened: the go signal or the end of the reveal.
    pub responding_since: Option<Mark>,
    pub time_limit_ms: u64,
    /// Level the round was built for; the session level moves on as soon as it is won.
    pub level: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundResult {
    pub outcome: Outcome,
    pub score_delta: u32,
    pub elapsed_ms: u64,
    pub timed_out: bool,
    pub false_start: bool,
}

/// Drives one play-through at a time of a single variant.
///
/// Every timer armed for a session carries that session's generation.
/// [`GameSessionController::restart`] cancels the old generation and bumps
/// the counter, so a countdown from a replaced session can never reach the
/// new one.
pub struct GameSessionController<C: Clock = MonotonicClock> {
    config: VariantConfig,
    session: GameSession,
    timers: TimerService<C>,
    generator: SequenceGenerator,
    submitter: Box<dyn ScoreSubmitter>,
    high_score: u32,
    /// Best score as it stood when the current session started.
    best_at_start: u32,
    generation: u64,
    round: Option<RoundState>,
    round_timers: Vec<TimerHandle>,
    pending_stimulus: Option<Stimulus>,
    last_result: Option<RoundResult>,
    countdown_ms: Option<u64>,
    submitted: bool,
}

impl<C: Clock> GameSessionController<C> {
    pub fn new(
        config: VariantConfig,
        generator: SequenceGenerator,
        clock: C,
        submitter: impl ScoreSubmitter + 'static,
        high_score: u32,
    ) -> Self {
        Self {
            session: GameSession::new(&config),
            config,
            timers: TimerService::new(clock),
            generator,
            submitter: Box::new(submitter),
            high_score,
            best_at_start: high_score,
            generation: 1,
            round: None,
            round_timers: Vec::new(),
            pending_stimulus: None,
            last_result: None,
            countdown_ms: None,
            submitted: false,
        }
    }

    pub fn config(&self) -> &VariantConfig {
        &self.config
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn state(&self) -> GameState {
        self.session.state
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn last_result(&self) -> Option<RoundResult> {
        self.last_result
    }

    /// Latest remaining time reported by the priming or round countdown.
    pub fn countdown_ms(&self) -> Option<u64> {
        self.countdown_ms
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Whether this session has outscored the best it started against.
    /// Stays true after the session ends; a tie does not count.
    pub fn beats_high_score(&self) -> bool {
        self.session.score > self.best_at_start
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// Index of the element being played back, for per-element reveals.
    pub fn playback_index(&self) -> Option<usize> {
        let round = self.round.as_ref()?;
        if round.phase != RoundPhase::Revealing {
            return None;
        }
        let step = self.config.step_duration_ms(self.session.level);
        if step == 0 {
            return None;
        }
        let since = self.now_ms().saturating_sub(round.stimulus.presented_at);
        let idx = (since / step) as usize;
        (idx < round.stimulus.len()).then_some(idx)
    }

    pub fn start(&mut self) -> Result<()> {
        if self.session.state != GameState::Idle {
            return Err(EngineError::SessionNotIdle { state: self.session.state });
        }
        self.config.validate()?;
        let now = self.now_ms();
        let first = self.generator.next(1, &self.config, now)?;
        if first.is_empty() {
            return Err(EngineError::EmptyStimulus { variant: self.config.variant, level: 1 });
        }
        self.pending_stimulus = Some(first);

        self.session.state = GameState::Priming;
        self.session.started_at = Some(now);
        self.best_at_start = self.high_score;
        info!(
            variant = %self.config.variant,
            generation = self.generation,
            best = self.high_score,
            "session started"
        );

        let now = Mark::at(now);
        if self.config.priming_ms == 0 {
            self.begin_round(now);
        } else {
            self.countdown_ms = Some(self.config.priming_ms);
            self.arm(now, self.config.priming_ms, self.config.priming_tick_ms, TimerKind::Priming);
        }
        Ok(())
    }

    /// Ends the running session, if any, and starts a fresh one.
    pub fn restart(&mut self) -> Result<()> {
        self.quit();
        self.timers.cancel_generation(self.generation);
        self.generation += 1;
        debug!(generation = self.generation, pending = self.timers.pending(), "session restarting");
        self.session = GameSession::new(&self.config);
        self.round = None;
        self.round_timers.clear();
        self.pending_stimulus = None;
        self.last_result = None;
        self.countdown_ms = None;
        self.submitted = false;
        self.start()
    }

    pub fn quit(&mut self) {
        match self.session.state {
            GameState::Priming | GameState::Active | GameState::RoundTransition => {
                self.end(EndReason::Quit);
            }
            GameState::Idle | GameState::Ended => {}
        }
    }

    /// Delivers every timer event that is due.
    pub fn update(&mut self) {
        while let Some(event) = self.timers.poll_next() {
            self.dispatch(event);
        }
    }

    /// Offers one player input. Timers due at or before this instant are
    /// handled first, so a round that has just timed out rejects the input.
    pub fn submit_input(&mut self, input: PlayerInput) -> Judgement {
        self.update();

        if self.session.state != GameState::Active {
            debug!(state = ?self.session.state, ?input, "input ignored outside active play");
            return Judgement::Ignored;
        }
        let Some(round) = self.round.as_mut() else {
            return Judgement::Ignored;
        };

        match round.phase {
            RoundPhase::Revealing | RoundPhase::Resolved => {
                debug!(?input, "input ignored during reveal");
                Judgement::Ignored
            }
            RoundPhase::AwaitingSignal => {
                debug!("false start");
                self.resolve(Outcome::Incorrect, false, true);
                Judgement::Wrong
            }
            RoundPhase::Responding => {
                let judgement = self.config.judge(&round.stimulus, &round.matched, &input);
                match judgement {
                    Judgement::Progress(element) => round.matched.push(element),
                    Judgement::Complete => self.resolve(Outcome::Correct, false, false),
                    Judgement::Wrong => self.resolve(Outcome::Incorrect, false, false),
                    Judgement::Ignored => {}
                }
                judgement
            }
        }
    }

    /// Timers run from `start`, the moment the phase they time began, so a
    /// late poll does not stretch the schedule.
    fn arm(&mut self, start: Mark, duration_ms: u64, tick_every_ms: u64, kind: TimerKind) -> TimerHandle {
        self.timers
            .start_countdown(start, duration_ms, tick_every_ms, kind, self.generation)
    }

    fn dispatch(&mut self, event: TimerEvent) {
        let handle = event.handle();
        if handle.generation != self.generation {
            debug!(
                stale = handle.generation,
                current = self.generation,
                kind = ?handle.kind,
                "stale timer event discarded"
            );
            return;
        }

        match event {
            TimerEvent::Tick { handle, remaining_ms } => {
                if matches!(handle.kind, TimerKind::Priming | TimerKind::Round) {
                    self.countdown_ms = Some(remaining_ms);
                }
            }
            TimerEvent::Expired { handle, deadline } => match (handle.kind, self.session.state) {
                (TimerKind::Priming, GameState::Priming) => self.begin_round(deadline),
                (TimerKind::Reveal, GameState::Active) => self.start_responding(deadline),
                (TimerKind::GoSignal, GameState::Active) => {
                    if let Some(round) = self.round.as_mut() {
                        round.stimulus.presented_at = deadline.ms();
                    }
                    self.start_responding(deadline);
                }
                (TimerKind::Round, GameState::Active) => {
                    debug!(level = self.session.level, "round timed out");
                    self.countdown_ms = Some(0);
                    self.resolve(Outcome::Incorrect, true, false);
                }
                (TimerKind::Transition, GameState::RoundTransition) => self.begin_round(deadline),
                (kind, state) => debug!(?kind, ?state, "timer expiry ignored"),
            },
        }
    }

    fn begin_round(&mut self, at: Mark) {
        let now = at.ms();
        let level = self.session.level;
        let stimulus = match self.pending_stimulus.take() {
            Some(stimulus) => Ok(stimulus),
            None => self.generator.next(level, &self.config, now),
        };
        let mut stimulus = match stimulus {
            Ok(s) if !s.is_empty() => s,
            Ok(_) | Err(_) => {
                error!(variant = %self.config.variant, level, "could not build a stimulus");
                self.end(EndReason::Fault);
                return;
            }
        };
        stimulus.presented_at = now;

        self.session.state = GameState::Active;
        self.round_timers.clear();
        self.countdown_ms = None;

        let go_delay = stimulus.elements.iter().find_map(|e| match e {
            Element::GoDelay(ms) => Some(*ms),
            _ => None,
        });
        let reveal_ms = stimulus.reveal_duration_ms;
        let phase = match (self.config.stimulus, self.config.reveal) {
            (StimulusShape::GoSignal { .. }, _) => RoundPhase::AwaitingSignal,
            (_, Reveal::Whole(_)) | (_, Reveal::PerElement(_)) => RoundPhase::Revealing,
            (_, Reveal::None) => RoundPhase::Responding,
        };
        debug!(level, len = stimulus.len(), ?phase, "round begins");

        self.round = Some(RoundState {
            stimulus,
            phase,
            matched: Vec::new(),
            responding_since: None,
            time_limit_ms: self.config.round_timeout_ms(level),
            level,
        });

        match phase {
            RoundPhase::AwaitingSignal => {
                let handle = self.arm(at, go_delay.unwrap_or(0), 0, TimerKind::GoSignal);
                self.round_timers.push(handle);
            }
            RoundPhase::Revealing => {
                let handle = self.arm(at, reveal_ms, 0, TimerKind::Reveal);
                self.round_timers.push(handle);
            }
            RoundPhase::Responding | RoundPhase::Resolved => self.start_responding(at),
        }
    }

    fn start_responding(&mut self, at: Mark) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        round.phase = RoundPhase::Responding;
        round.responding_since = Some(at);
        let limit = round.time_limit_ms;
        self.countdown_ms = Some(limit.saturating_sub(self.timers.elapsed_since(at)));
        let handle = self.arm(at, limit, self.config.round_tick_ms, TimerKind::Round);
        self.round_timers.push(handle);
    }

    fn resolve(&mut self, outcome: Outcome, timed_out: bool, false_start: bool) {
        for handle in self.round_timers.drain(..) {
            self.timers.cancel(handle);
        }
        let timing = match self.round.as_mut() {
            Some(round) => {
                round.phase = RoundPhase::Resolved;
                RoundTiming {
                    elapsed_ms: round
                        .responding_since
                        .map_or(0, |since| self.timers.elapsed_since(since)),
                    limit_ms: round.time_limit_ms,
                }
            }
            None => RoundTiming::default(),
        };

        let update = self
            .config
            .scoring
            .apply(outcome, timing, self.session.level, &self.session);

        self.session.score = self.session.score.saturating_add(update.score_delta);
        self.session.level = self.session.level.max(update.next_level);
        self.session.lives_remaining = self.session.lives_remaining.saturating_add_signed(update.lives_delta);
        if outcome == Outcome::Correct {
            self.session.rounds_won += 1;
        }
        self.last_result = Some(RoundResult {
            outcome,
            score_delta: update.score_delta,
            elapsed_ms: timing.elapsed_ms,
            timed_out,
            false_start,
        });
        info!(
            ?outcome,
            delta = update.score_delta,
            score = self.session.score,
            level = self.session.level,
            lives = self.session.lives_remaining,
            elapsed_ms = timing.elapsed_ms,
            "round resolved"
        );

        if update.ends_session {
            let reason = match (timed_out, self.config.lives()) {
                (true, _) => EndReason::TimedOut,
                (false, LifePolicy::Lives(_)) => EndReason::OutOfLives,
                (false, LifePolicy::SingleMistake) => EndReason::Mistake,
            };
            self.end(reason);
        } else {
            self.session.state = GameState::RoundTransition;
            let now = self.timers.mark();
            self.arm(now, self.config.transition_ms, 0, TimerKind::Transition);
        }
    }

    fn end(&mut self, reason: EndReason) {
        if self.session.state.is_terminal() {
            return;
        }
        let now = self.now_ms();
        self.session.state = GameState::Ended;
        self.session.ended_at = Some(now);
        self.session.end_reason = Some(reason);
        self.timers.cancel_generation(self.generation);
        self.round_timers.clear();
        self.countdown_ms = None;

        info!(
            variant = %self.config.variant,
            score = self.session.score,
            level = self.session.level,
            ?reason,
            "session ended"
        );

        if self.submitted {
            warn!("score already submitted for this session");
            return;
        }
        self.submitted = true;
        self.submitter.submit_play(&FinishedPlay {
            variant: self.config.variant,
            score: self.session.score,
            level: self.session.level,
            duration_ms: self.session.duration_ms(now),
        });
        self.high_score = self.high_score.max(self.session.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::ManualClock;
    use crate::engine::variant::Ramp;
    use crate::engine::Variant;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Submissions = Rc<RefCell<Vec<(Variant, u32)>>>;

    impl ScoreSubmitter for Submissions {
        fn submit_score(&mut self, variant: Variant, score: u32) {
            self.borrow_mut().push((variant, score));
        }
    }

    fn controller(
        config: VariantConfig,
    ) -> (GameSessionController<ManualClock>, ManualClock, Submissions) {
        let clock = ManualClock::new();
        let submissions = Submissions::default();
        let ctl = GameSessionController::new(
            config,
            SequenceGenerator::seeded(42),
            clock.clone(),
            submissions.clone(),
            0,
        );
        (ctl, clock, submissions)
    }

    fn tick(ctl: &mut GameSessionController<ManualClock>, clock: &ManualClock, ms: u64) {
        clock.advance(ms);
        ctl.update();
    }

    /// Runs priming and the reveal so the player may answer.
    fn to_responding(ctl: &mut GameSessionController<ManualClock>, clock: &ManualClock) {
        for _ in 0..100 {
            let responding = ctl.round().map(|r| r.phase) == Some(RoundPhase::Responding)
                && ctl.state() == GameState::Active;
            if responding || ctl.state() == GameState::Ended {
                return;
            }
            tick(ctl, clock, 50);
        }
        panic!("never reached the responding phase");
    }

    fn answer_memory(ctl: &mut GameSessionController<ManualClock>) {
        let cells: Vec<usize> = ctl
            .round()
            .unwrap()
            .stimulus
            .elements
            .iter()
            .map(|e| match e {
                Element::Cell(c) => *c,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        for cell in cells {
            ctl.submit_input(PlayerInput::Cell(cell));
        }
    }

    fn wrong_memory_cell(ctl: &GameSessionController<ManualClock>) -> usize {
        let side = ctl.config().grid_side(ctl.session().level);
        let round = ctl.round().unwrap();
        (0..side * side)
            .find(|c| !round.stimulus.elements.contains(&Element::Cell(*c)))
            .unwrap()
    }

    fn answer_binary(ctl: &GameSessionController<ManualClock>) -> String {
        format!("{:b}", ctl.round().unwrap().stimulus.decimal().unwrap())
    }

    #[test]
    fn memory_scenario_loses_three_lives_after_one_win() {
        let (mut ctl, clock, submissions) = controller(VariantConfig::memory_matrix());
        ctl.start().unwrap();
        assert_eq!(ctl.state(), GameState::Priming);

        to_responding(&mut ctl, &clock);
        assert_eq!(ctl.round().unwrap().stimulus.len(), 3);
        assert_eq!(ctl.session().lives_remaining, 3);
        answer_memory(&mut ctl);
        assert_eq!(ctl.state(), GameState::RoundTransition);
        assert_eq!(ctl.session().level, 2);
        let won = ctl.session().score;
        assert!(won > 0);

        for expected_lives in [2, 1] {
            to_responding(&mut ctl, &clock);
            let wrong = wrong_memory_cell(&ctl);
            assert_eq!(ctl.submit_input(PlayerInput::Cell(wrong)), Judgement::Wrong);
            assert_eq!(ctl.session().lives_remaining, expected_lives);
            assert_eq!(ctl.state(), GameState::RoundTransition);
            assert_eq!(ctl.session().level, 2);
        }

        to_responding(&mut ctl, &clock);
        let wrong = wrong_memory_cell(&ctl);
        ctl.submit_input(PlayerInput::Cell(wrong));
        assert_eq!(ctl.session().lives_remaining, 0);
        assert_eq!(ctl.state(), GameState::Ended);
        assert_eq!(ctl.session().end_reason, Some(EndReason::OutOfLives));
        assert_eq!(*submissions.borrow(), vec![(Variant::MemorySequence, won)]);
    }

    #[test]
    fn reaction_scores_faster_presses_higher() {
        let mut deltas = Vec::new();
        for reaction_ms in [180, 600] {
            let (mut ctl, clock, _) = controller(VariantConfig::reaction_test());
            ctl.start().unwrap();
            tick(&mut ctl, &clock, 3_000);
            assert_eq!(ctl.state(), GameState::Active);
            assert_eq!(ctl.round().unwrap().phase, RoundPhase::AwaitingSignal);

            let delay = match ctl.round().unwrap().stimulus.elements[0] {
                Element::GoDelay(ms) => ms,
                other => panic!("unexpected {other:?}"),
            };
            tick(&mut ctl, &clock, delay);
            assert_eq!(ctl.round().unwrap().phase, RoundPhase::Responding);

            clock.advance(reaction_ms);
            assert_eq!(ctl.submit_input(PlayerInput::Press), Judgement::Complete);
            let result = ctl.last_result().unwrap();
            assert_eq!(result.elapsed_ms, reaction_ms);
            deltas.push(result.score_delta);
        }
        assert!(deltas[0] > deltas[1]);
    }

    #[test]
    fn reaction_time_counts_from_the_go_signal_not_the_poll() {
        let (mut ctl, clock, _) = controller(VariantConfig::reaction_test());
        ctl.start().unwrap();
        tick(&mut ctl, &clock, 3_000);
        let delay = match ctl.round().unwrap().stimulus.elements[0] {
            Element::GoDelay(ms) => ms,
            other => panic!("unexpected {other:?}"),
        };
        let go_at = clock.now_ms() + delay;

        // Nothing polls the go signal before the press arrives.
        clock.advance(delay + 150);
        assert_eq!(ctl.submit_input(PlayerInput::Press), Judgement::Complete);
        let result = ctl.last_result().unwrap();
        assert_eq!(result.elapsed_ms, 150);
        assert_eq!(result.score_delta, 10 + (1_000 - 150) / 10);
        assert_eq!(ctl.round().unwrap().stimulus.presented_at, go_at);
    }

    #[test]
    fn late_poll_does_not_extend_the_response_window() {
        let (mut ctl, clock, _) = controller(VariantConfig::memory_matrix());
        ctl.start().unwrap();
        tick(&mut ctl, &clock, 1_000);
        let reveal = ctl.round().unwrap().stimulus.reveal_duration_ms;
        let limit = ctl.round().unwrap().time_limit_ms;

        // One poll lands well after both the reveal and the round deadline.
        tick(&mut ctl, &clock, reveal + limit + 500);
        assert_eq!(ctl.state(), GameState::RoundTransition);
        assert!(ctl.last_result().unwrap().timed_out);
    }

    #[test]
    fn round_keeps_its_level_after_a_win() {
        let (mut ctl, clock, _) = controller(VariantConfig::binary_breaker());
        ctl.start().unwrap();
        to_responding(&mut ctl, &clock);
        let answer = answer_binary(&ctl);
        ctl.submit_input(PlayerInput::Digits(answer));
        assert_eq!(ctl.state(), GameState::RoundTransition);
        assert_eq!(ctl.session().level, 2);
        assert_eq!(ctl.round().unwrap().level, 1);

        tick(&mut ctl, &clock, 600);
        assert_eq!(ctl.round().unwrap().level, 2);
    }

    #[test]
    fn reaction_false_start_ends_session() {
        let (mut ctl, clock, submissions) = controller(VariantConfig::reaction_test());
        ctl.start().unwrap();
        tick(&mut ctl, &clock, 3_000);
        tick(&mut ctl, &clock, 500);
        assert_eq!(ctl.submit_input(PlayerInput::Press), Judgement::Wrong);
        assert_eq!(ctl.state(), GameState::Ended);
        assert!(ctl.last_result().unwrap().false_start);
        assert_eq!(submissions.borrow().len(), 1);
    }

    #[test]
    fn binary_correct_then_wrong_ends_immediately() {
        let (mut ctl, clock, submissions) = controller(VariantConfig::binary_breaker());
        ctl.start().unwrap();
        to_responding(&mut ctl, &clock);
        assert_eq!(ctl.round().unwrap().time_limit_ms, 10_000);

        let answer = answer_binary(&ctl);
        clock.advance(2_000);
        assert_eq!(ctl.submit_input(PlayerInput::Digits(answer)), Judgement::Complete);
        assert_eq!(ctl.session().level, 2);
        let score = ctl.session().score;
        assert_eq!(score, 20 + 80);

        to_responding(&mut ctl, &clock);
        let value = ctl.round().unwrap().stimulus.decimal().unwrap();
        let wrong = format!("{:b}", value ^ 1);
        assert_eq!(ctl.submit_input(PlayerInput::Digits(wrong)), Judgement::Wrong);
        assert_eq!(ctl.state(), GameState::Ended);
        assert_eq!(ctl.session().end_reason, Some(EndReason::Mistake));
        assert_eq!(ctl.session().level, 2);
        assert_eq!(*submissions.borrow(), vec![(Variant::NumericConversion, score)]);
    }

    #[test]
    fn round_timeout_counts_as_a_miss() {
        let (mut ctl, clock, submissions) = controller(VariantConfig::binary_breaker());
        ctl.start().unwrap();
        to_responding(&mut ctl, &clock);
        let limit = ctl.round().unwrap().time_limit_ms;
        let answer = answer_binary(&ctl);

        clock.advance(limit);
        // The expiry is processed before the late answer.
        assert_eq!(ctl.submit_input(PlayerInput::Digits(answer)), Judgement::Ignored);
        assert_eq!(ctl.state(), GameState::Ended);
        assert_eq!(ctl.session().end_reason, Some(EndReason::TimedOut));
        assert_eq!(ctl.session().score, 0);
        assert_eq!(submissions.borrow().len(), 1);
    }

    #[test]
    fn memory_timeout_costs_a_life() {
        let (mut ctl, clock, _) = controller(VariantConfig::memory_matrix());
        ctl.start().unwrap();
        to_responding(&mut ctl, &clock);
        let limit = ctl.config().round_timeout_ms(1);
        tick(&mut ctl, &clock, limit);
        assert_eq!(ctl.session().lives_remaining, 2);
        assert_eq!(ctl.state(), GameState::RoundTransition);
        assert!(ctl.last_result().unwrap().timed_out);
    }

    #[test]
    fn input_outside_active_play_changes_nothing() {
        let (mut ctl, clock, _) = controller(VariantConfig::pattern_pulse());
        let inputs = [
            PlayerInput::Pad(0),
            PlayerInput::Pad(1),
            PlayerInput::Press,
            PlayerInput::Digits("1".into()),
        ];
        let snapshot = |ctl: &GameSessionController<ManualClock>| {
            let s = ctl.session();
            (s.score, s.level, s.lives_remaining)
        };

        for input in inputs.clone() {
            assert_eq!(ctl.submit_input(input), Judgement::Ignored);
        }
        assert_eq!(ctl.state(), GameState::Idle);

        ctl.start().unwrap();
        let before = snapshot(&ctl);
        for input in inputs.clone() {
            assert_eq!(ctl.submit_input(input), Judgement::Ignored);
        }
        assert_eq!(snapshot(&ctl), before);

        // Playback in progress.
        tick(&mut ctl, &clock, 1_000);
        assert_eq!(ctl.round().unwrap().phase, RoundPhase::Revealing);
        for input in inputs.clone() {
            assert_eq!(ctl.submit_input(input), Judgement::Ignored);
        }
        assert_eq!(snapshot(&ctl), before);

        ctl.quit();
        let ended = snapshot(&ctl);
        for input in inputs {
            assert_eq!(ctl.submit_input(input), Judgement::Ignored);
        }
        assert_eq!(snapshot(&ctl), ended);
    }

    #[test]
    fn pattern_playback_steps_through_elements() {
        let (mut ctl, clock, _) = controller(VariantConfig::pattern_pulse());
        ctl.start().unwrap();
        tick(&mut ctl, &clock, 1_000);
        assert_eq!(ctl.playback_index(), Some(0));
        let step = ctl.config().step_duration_ms(1);
        clock.advance(step);
        assert_eq!(ctl.playback_index(), Some(1));

        to_responding(&mut ctl, &clock);
        assert_eq!(ctl.playback_index(), None);
        let pads: Vec<PlayerInput> = ctl
            .round()
            .unwrap()
            .stimulus
            .elements
            .iter()
            .map(|e| match e {
                Element::Pad(p) => PlayerInput::Pad(*p),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        let last = pads.len() - 1;
        for (i, pad) in pads.into_iter().enumerate() {
            let judgement = ctl.submit_input(pad);
            if i == last {
                assert_eq!(judgement, Judgement::Complete);
            } else {
                assert!(matches!(judgement, Judgement::Progress(_)));
            }
        }
        assert_eq!(ctl.session().level, 2);
    }

    #[test]
    fn score_never_decreases() {
        let (mut ctl, clock, _) = controller(VariantConfig::memory_matrix());
        ctl.start().unwrap();
        let mut last = 0;
        for round in 0..12 {
            to_responding(&mut ctl, &clock);
            if ctl.state() == GameState::Ended {
                break;
            }
            if round % 3 == 2 {
                let wrong = wrong_memory_cell(&ctl);
                ctl.submit_input(PlayerInput::Cell(wrong));
            } else {
                answer_memory(&mut ctl);
            }
            assert!(ctl.session().score >= last);
            last = ctl.session().score;
        }
    }

    #[test]
    fn submits_exactly_once_even_after_repeated_quits() {
        let (mut ctl, clock, submissions) = controller(VariantConfig::memory_matrix());
        ctl.start().unwrap();
        assert!(submissions.borrow().is_empty());
        tick(&mut ctl, &clock, 200);
        ctl.quit();
        ctl.quit();
        tick(&mut ctl, &clock, 60_000);
        assert_eq!(ctl.state(), GameState::Ended);
        assert_eq!(ctl.session().end_reason, Some(EndReason::Quit));
        assert_eq!(submissions.borrow().len(), 1);
    }

    #[test]
    fn restart_discards_the_old_sessions_timers() {
        let (mut ctl, clock, submissions) = controller(VariantConfig::binary_breaker());
        ctl.start().unwrap();
        to_responding(&mut ctl, &clock);
        let old_generation = ctl.generation();

        ctl.restart().unwrap();
        assert_eq!(submissions.borrow().len(), 1);
        assert_eq!(ctl.generation(), old_generation + 1);
        assert_eq!(ctl.state(), GameState::Priming);

        // A straggler from the replaced session is dropped on the floor.
        ctl.dispatch(TimerEvent::Expired {
            handle: TimerHandle { id: 9_999, generation: old_generation, kind: TimerKind::Priming },
            deadline: Mark::at(0),
        });
        assert_eq!(ctl.state(), GameState::Priming);

        tick(&mut ctl, &clock, 2_000);
        assert_eq!(ctl.state(), GameState::Priming);
        tick(&mut ctl, &clock, 1_000);
        assert_eq!(ctl.state(), GameState::Active);

        // Past the replaced round's deadline, before the new one.
        tick(&mut ctl, &clock, 8_000);
        assert_eq!(ctl.state(), GameState::Active);
        assert_eq!(submissions.borrow().len(), 1);
    }

    #[test]
    fn start_twice_is_rejected() {
        let (mut ctl, _, _) = controller(VariantConfig::reaction_test());
        ctl.start().unwrap();
        assert_eq!(
            ctl.start(),
            Err(EngineError::SessionNotIdle { state: GameState::Priming })
        );
    }

    #[test]
    fn empty_stimulus_refuses_to_start() {
        let mut config = VariantConfig::memory_matrix();
        config.stimulus = StimulusShape::Grid { base_length: 0, min_side: 3 };
        let (mut ctl, clock, submissions) = controller(config);
        assert!(matches!(ctl.start(), Err(EngineError::EmptyStimulus { .. })));
        tick(&mut ctl, &clock, 10_000);
        assert_eq!(ctl.state(), GameState::Idle);
        assert!(submissions.borrow().is_empty());
    }

    #[test]
    fn priming_counts_down() {
        let (mut ctl, clock, _) = controller(VariantConfig::reaction_test());
        ctl.start().unwrap();
        assert_eq!(ctl.countdown_ms(), Some(3_000));
        tick(&mut ctl, &clock, 1_000);
        assert_eq!(ctl.countdown_ms(), Some(2_000));
        tick(&mut ctl, &clock, 1_000);
        assert_eq!(ctl.countdown_ms(), Some(1_000));
    }

    #[test]
    fn zero_priming_goes_straight_to_play() {
        let mut config = VariantConfig::binary_breaker();
        config.priming_ms = 0;
        config.round_timeout = Ramp::new(5_000, 0, 5_000);
        let (mut ctl, _, _) = controller(config);
        ctl.start().unwrap();
        assert_eq!(ctl.state(), GameState::Active);
        assert_eq!(ctl.round().unwrap().phase, RoundPhase::Responding);
        assert_eq!(ctl.countdown_ms(), Some(5_000));
    }

    #[test]
    fn finishing_above_best_raises_displayed_high_score() {
        let (mut ctl, clock, _) = controller(VariantConfig::binary_breaker());
        ctl.start().unwrap();
        to_responding(&mut ctl, &clock);
        let answer = answer_binary(&ctl);
        ctl.submit_input(PlayerInput::Digits(answer));
        assert!(ctl.beats_high_score());
        ctl.quit();
        assert_eq!(ctl.high_score(), ctl.session().score);
        assert!(ctl.beats_high_score());

        // The next session has to beat the raised best.
        ctl.restart().unwrap();
        assert!(!ctl.beats_high_score());
    }

    #[test]
    fn tying_the_best_is_not_a_new_best() {
        let clock = ManualClock::new();
        let mut ctl = GameSessionController::new(
            VariantConfig::memory_matrix(),
            SequenceGenerator::seeded(42),
            clock.clone(),
            Submissions::default(),
            10,
        );
        ctl.start().unwrap();
        to_responding(&mut ctl, &clock);
        answer_memory(&mut ctl);
        ctl.quit();
        assert_eq!(ctl.session().score, 10);
        assert_eq!(ctl.high_score(), 10);
        assert!(!ctl.beats_high_score());
    }
}
