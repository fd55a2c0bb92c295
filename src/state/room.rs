//! Per-session room state machine.
//!
//! A [`RoomSession`] owns one session's mutable state. Operations execute
//! to completion under the room lock, so phase transitions never observe a
//! half-applied event. Host-only operations called by anyone else are
//! silently ignored (logged at debug) rather than surfaced as errors.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::models::{
        HistoryEntryEntity, LeaderboardEntryEntity, PlayerResultEntity, SnapshotEntity,
    },
    state::scoring,
};

/// Every question carries exactly this many options.
pub const OPTION_COUNT: usize = 4;

/// Display name used when a participant joins with a blank name.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Stage of the room lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// Waiting for the host to start; participants may join.
    Lobby,
    /// A question is live and answers are accepted.
    QuestionActive,
    /// The current question's answer has been revealed.
    Reveal,
    /// All questions exhausted; final leaderboard shown.
    GameOver,
    /// Host disconnected; the registry entry is gone.
    Ended,
}

/// A validated, normalized quiz question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Question text shown to participants.
    pub text: String,
    /// The four answer options, in display order.
    pub options: [String; OPTION_COUNT],
    /// Zero-based index of the correct option.
    pub correct_index: usize,
    /// Answer window in seconds, always positive after normalization.
    pub time_limit_sec: u32,
    /// Optional explanation revealed with the answer.
    pub explanation: Option<String>,
}

/// A connected participant and their per-question answer state.
#[derive(Debug, Clone)]
pub struct Player {
    /// Display name (deduplication is not attempted).
    pub name: String,
    /// Cumulative score across revealed questions.
    pub score: i64,
    /// When the current question was answered, if it was.
    pub answered_at_ms: Option<i64>,
    /// Option index the participant chose, unchecked against the range.
    pub chosen_index: Option<i64>,
    /// Whether the last revealed answer was correct.
    pub last_correct: bool,
}

/// Immutable record appended at each reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Zero-based question index.
    pub index: usize,
    /// Question text.
    pub question: String,
    /// Zero-based index of the correct option.
    pub correct_index: usize,
    /// Optional explanation.
    pub explanation: Option<String>,
    /// Snapshot of every participant's outcome at that moment.
    pub per_player: Vec<PlayerResult>,
}

/// One participant's outcome for one revealed question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerResult {
    /// Display name.
    pub name: String,
    /// Whether the chosen option was correct.
    pub correct: bool,
    /// Clamped answer latency in milliseconds (full duration if unanswered).
    pub time_ms: i64,
    /// Points earned on this question.
    pub earned: i64,
    /// Cumulative score after the award.
    pub score: i64,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Display name.
    pub name: String,
    /// Cumulative score.
    pub score: i64,
}

/// Host-facing progress counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    /// Number of currently joined participants.
    pub joined: usize,
    /// Number of participants who answered the current question.
    pub answered: usize,
    /// Whether answers are currently accepted.
    pub accepting: bool,
    /// Advisory answer deadline, epoch milliseconds.
    pub deadline_epoch_ms: i64,
}

/// Broadcast data for a freshly started question (correct index withheld).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionStart {
    /// Zero-based question index.
    pub index: usize,
    /// Total number of loaded questions.
    pub total: usize,
    /// Question text.
    pub question: String,
    /// The four options in display order.
    pub options: [String; OPTION_COUNT],
    /// Answer window in seconds.
    pub time_limit_sec: u32,
    /// Advisory deadline, epoch milliseconds.
    pub deadline_epoch_ms: i64,
}

/// Result of a [`RoomSession::next_question`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextOutcome {
    /// A new question went live.
    Question(QuestionStart),
    /// The question list is exhausted; the session is over.
    GameOver {
        /// Final standings.
        leaderboard: Vec<LeaderboardEntry>,
    },
    /// The call had no effect (wrong caller or terminal phase).
    Ignored,
}

/// Result of a [`RoomSession::submit_answer`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The answer was recorded.
    Recorded {
        /// Updated progress counters for the host.
        status: StatusReport,
        /// Present when this answer completed the set and triggered reveal.
        auto_reveal: Option<RevealOutcome>,
    },
    /// The answer was dropped (wrong phase, unknown participant, duplicate).
    Ignored,
}

/// Everything broadcast when a question is revealed.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealOutcome {
    /// Zero-based index of the correct option.
    pub correct_index: usize,
    /// Optional explanation.
    pub explanation: Option<String>,
    /// Standings after awarding this question's points.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Per-participant outcomes.
    pub per_player: Vec<PlayerResult>,
    /// Raw per-option answer counts (host only).
    pub tally: [u32; OPTION_COUNT],
}

/// Outcome of a join: the normalized name and the (possibly carried) score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedPlayer {
    /// Normalized display name.
    pub name: String,
    /// Starting score, seeded from a resume carry-over when the name matches.
    pub score: i64,
}

/// Single-writer state container for one live session.
#[derive(Debug)]
pub struct RoomSession {
    pin: String,
    host: Option<Uuid>,
    questions: Vec<Question>,
    current_index: i64,
    phase: RoomPhase,
    question_started_at_ms: i64,
    deadline_epoch_ms: i64,
    tally: [u32; OPTION_COUNT],
    history: Vec<HistoryEntry>,
    players: IndexMap<Uuid, Player>,
    carried_scores: HashMap<String, i64>,
}

impl RoomSession {
    /// Fresh session in `Lobby` with the creating connection as host.
    pub fn new(pin: String, host: Uuid) -> Self {
        Self {
            pin,
            host: Some(host),
            questions: Vec::new(),
            current_index: -1,
            phase: RoomPhase::Lobby,
            question_started_at_ms: 0,
            deadline_epoch_ms: 0,
            tally: [0; OPTION_COUNT],
            history: Vec::new(),
            players: IndexMap::new(),
            carried_scores: HashMap::new(),
        }
    }

    /// Session reconstructed from a durable snapshot: no host attached,
    /// position restored to the last revealed question so the next
    /// `next_question` advances past it, scores carried over by name.
    pub fn resumed(pin: String, history: Vec<HistoryEntry>, carried: HashMap<String, i64>) -> Self {
        let current_index = history.last().map_or(-1, |entry| entry.index as i64);
        Self {
            pin,
            host: None,
            questions: Vec::new(),
            current_index,
            phase: RoomPhase::Lobby,
            question_started_at_ms: 0,
            deadline_epoch_ms: 0,
            tally: [0; OPTION_COUNT],
            history,
            players: IndexMap::new(),
            carried_scores: carried,
        }
    }

    /// Session PIN.
    pub fn pin(&self) -> &str {
        &self.pin
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// Host connection, if one is attached.
    pub fn host(&self) -> Option<Uuid> {
        self.host
    }

    /// Whether `conn` is the registered host.
    pub fn is_host(&self, conn: Uuid) -> bool {
        self.host == Some(conn)
    }

    /// Index of the current question, `-1` before the first one.
    pub fn current_index(&self) -> i64 {
        self.current_index
    }

    /// Revealed-question history, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Number of loaded questions.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// The live question, when the index is in range.
    pub fn current_question(&self) -> Option<&Question> {
        usize::try_from(self.current_index)
            .ok()
            .and_then(|index| self.questions.get(index))
    }

    /// Connections that should receive session-wide broadcasts.
    pub fn member_ids(&self) -> Vec<Uuid> {
        self.host.into_iter().chain(self.players.keys().copied()).collect()
    }

    /// Mark the session terminal after its registry entry was removed.
    pub fn mark_ended(&mut self) {
        self.phase = RoomPhase::Ended;
    }

    /// Bind a host connection to a resumed session. Ignored when a host is
    /// already attached.
    pub fn attach_host(&mut self, conn: Uuid) -> bool {
        if self.host.is_some() {
            debug!(pin = %self.pin, %conn, "attach ignored: host already bound");
            return false;
        }
        self.host = Some(conn);
        true
    }

    /// Replace the question sequence. Host-only; does not change phase or
    /// reset the current index. Ignored in `Ended`.
    pub fn load_questions(&mut self, caller: Uuid, questions: Vec<Question>) -> bool {
        if !self.is_host(caller) {
            debug!(pin = %self.pin, %caller, "load-quiz ignored: caller is not the host");
            return false;
        }
        if self.phase == RoomPhase::Ended {
            return false;
        }
        self.questions = questions;
        true
    }

    /// Add a participant. A blank name becomes [`ANONYMOUS_NAME`]; a name
    /// matching a resume carry-over (exact, case-sensitive) seeds its score.
    /// Re-joining on the same connection is a no-op.
    pub fn join(&mut self, conn: Uuid, name: &str) -> JoinedPlayer {
        if let Some(existing) = self.players.get(&conn) {
            return JoinedPlayer {
                name: existing.name.clone(),
                score: existing.score,
            };
        }

        let name = match name.trim() {
            "" => ANONYMOUS_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        let score = self.carried_scores.get(&name).copied().unwrap_or(0);

        self.players.insert(
            conn,
            Player {
                name: name.clone(),
                score,
                answered_at_ms: None,
                chosen_index: None,
                last_correct: false,
            },
        );

        JoinedPlayer { name, score }
    }

    /// Remove a participant, returning it when one was registered.
    pub fn remove_player(&mut self, conn: Uuid) -> Option<Player> {
        // shift_remove keeps join order for the remaining players.
        self.players.shift_remove(&conn)
    }

    /// Advance to the next question or finish the game. Host-only; ignored
    /// in terminal phases.
    pub fn next_question(&mut self, caller: Uuid, now_ms: i64) -> NextOutcome {
        if !self.is_host(caller) {
            debug!(pin = %self.pin, %caller, "next-question ignored: caller is not the host");
            return NextOutcome::Ignored;
        }
        if matches!(self.phase, RoomPhase::GameOver | RoomPhase::Ended) {
            return NextOutcome::Ignored;
        }

        self.current_index += 1;

        let Some(index) = usize::try_from(self.current_index)
            .ok()
            .filter(|index| *index < self.questions.len())
        else {
            self.phase = RoomPhase::GameOver;
            return NextOutcome::GameOver {
                leaderboard: self.leaderboard(),
            };
        };

        for player in self.players.values_mut() {
            player.answered_at_ms = None;
            player.chosen_index = None;
        }
        self.tally = [0; OPTION_COUNT];

        let question = &self.questions[index];
        self.phase = RoomPhase::QuestionActive;
        self.question_started_at_ms = now_ms;
        self.deadline_epoch_ms = now_ms + i64::from(question.time_limit_sec) * 1000;

        NextOutcome::Question(QuestionStart {
            index,
            total: self.questions.len(),
            question: question.text.clone(),
            options: question.options.clone(),
            time_limit_sec: question.time_limit_sec,
            deadline_epoch_ms: self.deadline_epoch_ms,
        })
    }

    /// Record a participant's answer. First answer wins; duplicates,
    /// unknown participants, and answers outside `QuestionActive` are
    /// dropped. When the last joined participant answers, the reveal fires
    /// immediately.
    pub fn submit_answer(&mut self, conn: Uuid, option_index: i64, now_ms: i64) -> SubmitOutcome {
        if self.phase != RoomPhase::QuestionActive {
            return SubmitOutcome::Ignored;
        }
        let Some(player) = self.players.get_mut(&conn) else {
            return SubmitOutcome::Ignored;
        };
        if player.answered_at_ms.is_some() {
            return SubmitOutcome::Ignored;
        }

        player.answered_at_ms = Some(now_ms);
        player.chosen_index = Some(option_index);

        // An out-of-range choice is still an answer; it just never tallies.
        if let Ok(index) = usize::try_from(option_index)
            && index < OPTION_COUNT
        {
            self.tally[index] += 1;
        }

        let auto_reveal = if self.all_answered() {
            self.do_reveal()
        } else {
            None
        };

        SubmitOutcome::Recorded {
            status: self.status_report(),
            auto_reveal,
        }
    }

    /// Host-triggered reveal. No-op unless a question is active.
    pub fn reveal_requested(&mut self, caller: Uuid) -> Option<RevealOutcome> {
        if !self.is_host(caller) {
            debug!(pin = %self.pin, %caller, "reveal ignored: caller is not the host");
            return None;
        }
        self.do_reveal()
    }

    /// Current standings: stable sort by descending score, so equal scores
    /// keep join order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .players
            .values()
            .map(|player| LeaderboardEntry {
                name: player.name.clone(),
                score: player.score,
            })
            .collect();
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.score));
        entries
    }

    /// Progress counters for the host's status display.
    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            joined: self.players.len(),
            answered: self.answered_count(),
            accepting: self.phase == RoomPhase::QuestionActive,
            deadline_epoch_ms: self.deadline_epoch_ms,
        }
    }

    /// Durable projection of this session; never contains connection ids.
    pub fn snapshot(&self, now_ms: i64, leaderboard_limit: usize) -> SnapshotEntity {
        let mut leaderboard: Vec<LeaderboardEntryEntity> = self
            .leaderboard()
            .into_iter()
            .map(|entry| LeaderboardEntryEntity {
                name: entry.name,
                score: entry.score,
            })
            .collect();
        leaderboard.truncate(leaderboard_limit);

        SnapshotEntity {
            pin: self.pin.clone(),
            current_index: self.current_index,
            leaderboard,
            history: self.history.iter().map(Into::into).collect(),
            timestamp: now_ms,
        }
    }

    fn answered_count(&self) -> usize {
        self.players
            .values()
            .filter(|player| player.answered_at_ms.is_some())
            .count()
    }

    fn all_answered(&self) -> bool {
        !self.players.is_empty() && self.answered_count() == self.players.len()
    }

    /// Shared reveal path for the host trigger and the all-answered rule.
    fn do_reveal(&mut self) -> Option<RevealOutcome> {
        if self.phase != RoomPhase::QuestionActive {
            return None;
        }
        let index = usize::try_from(self.current_index).ok()?;
        let question = self.questions.get(index)?.clone();

        self.phase = RoomPhase::Reveal;

        let duration_ms = i64::from(question.time_limit_sec) * 1000;
        let started_at = self.question_started_at_ms;

        let mut per_player = Vec::with_capacity(self.players.len());
        for player in self.players.values_mut() {
            let earned = scoring::score(
                &question,
                player.answered_at_ms,
                started_at,
                player.chosen_index,
            );
            player.score += earned;
            player.last_correct = player.chosen_index == Some(question.correct_index as i64);

            let time_ms = player
                .answered_at_ms
                .map_or(duration_ms, |at| (at - started_at).clamp(0, duration_ms));

            per_player.push(PlayerResult {
                name: player.name.clone(),
                correct: player.last_correct,
                time_ms,
                earned,
                score: player.score,
            });
        }

        self.history.push(HistoryEntry {
            index,
            question: question.text.clone(),
            correct_index: question.correct_index,
            explanation: question.explanation.clone(),
            per_player: per_player.clone(),
        });

        Some(RevealOutcome {
            correct_index: question.correct_index,
            explanation: question.explanation,
            leaderboard: self.leaderboard(),
            per_player,
            tally: self.tally,
        })
    }
}

impl From<&HistoryEntry> for HistoryEntryEntity {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            index: entry.index,
            question: entry.question.clone(),
            correct_index: entry.correct_index,
            explanation: entry.explanation.clone(),
            per_player: entry
                .per_player
                .iter()
                .map(|result| PlayerResultEntity {
                    name: result.name.clone(),
                    correct: result.correct,
                    score: result.score,
                    time_ms: result.time_ms,
                    earned: result.earned,
                })
                .collect(),
        }
    }
}

impl From<HistoryEntryEntity> for HistoryEntry {
    fn from(entity: HistoryEntryEntity) -> Self {
        Self {
            index: entity.index,
            question: entity.question,
            correct_index: entity.correct_index,
            explanation: entity.explanation,
            per_player: entity
                .per_player
                .into_iter()
                .map(|result| PlayerResult {
                    name: result.name,
                    correct: result.correct,
                    time_ms: result.time_ms,
                    earned: result.earned,
                    score: result.score,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(count: usize) -> Vec<Question> {
        (0..count)
            .map(|i| Question {
                text: format!("question {i}"),
                options: ["a".into(), "b".into(), "c".into(), "d".into()],
                correct_index: 1,
                time_limit_sec: 20,
                explanation: (i == 0).then(|| "because".to_string()),
            })
            .collect()
    }

    fn room_with_players(player_count: usize) -> (RoomSession, Uuid, Vec<Uuid>) {
        let host = Uuid::new_v4();
        let mut room = RoomSession::new("123456".into(), host);
        assert!(room.load_questions(host, questions(2)));

        let players: Vec<Uuid> = (0..player_count).map(|_| Uuid::new_v4()).collect();
        for (i, conn) in players.iter().enumerate() {
            room.join(*conn, &format!("player-{i}"));
        }
        (room, host, players)
    }

    #[test]
    fn starts_in_lobby_with_no_question() {
        let room = RoomSession::new("123456".into(), Uuid::new_v4());
        assert_eq!(room.phase(), RoomPhase::Lobby);
        assert_eq!(room.current_index(), -1);
        assert!(room.current_question().is_none());
    }

    #[test]
    fn next_question_starts_and_resets_per_question_state() {
        let (mut room, host, players) = room_with_players(2);

        match room.next_question(host, 1_000) {
            NextOutcome::Question(start) => {
                assert_eq!(start.index, 0);
                assert_eq!(start.total, 2);
                assert_eq!(start.deadline_epoch_ms, 21_000);
            }
            other => panic!("expected a question start, got {other:?}"),
        }
        assert_eq!(room.phase(), RoomPhase::QuestionActive);

        // Answer, reveal, then advance: answer state must reset.
        assert!(matches!(
            room.submit_answer(players[0], 1, 2_000),
            SubmitOutcome::Recorded { .. }
        ));
        room.reveal_requested(host).unwrap();
        match room.next_question(host, 10_000) {
            NextOutcome::Question(start) => assert_eq!(start.index, 1),
            other => panic!("expected a question start, got {other:?}"),
        }
        assert_eq!(room.status_report().answered, 0);
        assert_eq!(room.tally, [0; OPTION_COUNT]);
    }

    #[test]
    fn host_only_operations_ignore_other_callers() {
        let (mut room, _host, players) = room_with_players(1);
        let stranger = Uuid::new_v4();

        assert!(!room.load_questions(stranger, questions(1)));
        assert_eq!(room.next_question(players[0], 0), NextOutcome::Ignored);
        assert_eq!(room.next_question(stranger, 0), NextOutcome::Ignored);
        assert_eq!(room.phase(), RoomPhase::Lobby);
        assert!(room.reveal_requested(stranger).is_none());
    }

    #[test]
    fn duplicate_answers_are_dropped_and_tally_counts_once() {
        let (mut room, host, players) = room_with_players(2);
        room.next_question(host, 0);

        assert!(matches!(
            room.submit_answer(players[0], 2, 100),
            SubmitOutcome::Recorded { .. }
        ));
        assert_eq!(room.submit_answer(players[0], 1, 200), SubmitOutcome::Ignored);

        assert_eq!(room.tally, [0, 0, 1, 0]);
        let status = room.status_report();
        assert_eq!(status.answered, 1);
        assert_eq!(status.joined, 2);
    }

    #[test]
    fn answers_outside_question_active_or_from_strangers_are_dropped() {
        let (mut room, host, players) = room_with_players(2);
        assert_eq!(room.submit_answer(players[0], 1, 0), SubmitOutcome::Ignored);

        room.next_question(host, 0);
        assert_eq!(
            room.submit_answer(Uuid::new_v4(), 1, 100),
            SubmitOutcome::Ignored
        );

        room.reveal_requested(host).unwrap();
        assert_eq!(room.submit_answer(players[1], 1, 600), SubmitOutcome::Ignored);
    }

    #[test]
    fn out_of_range_choice_is_recorded_but_never_tallies() {
        let (mut room, host, players) = room_with_players(2);
        room.next_question(host, 0);

        assert!(matches!(
            room.submit_answer(players[0], 9, 100),
            SubmitOutcome::Recorded { .. }
        ));
        assert_eq!(room.tally, [0; OPTION_COUNT]);

        // The recorded answer still counts toward auto-reveal.
        match room.submit_answer(players[1], 1, 200) {
            SubmitOutcome::Recorded { auto_reveal, .. } => {
                let reveal = auto_reveal.expect("all answered should reveal");
                let bogus = &reveal.per_player[0];
                assert!(!bogus.correct);
                assert_eq!(bogus.earned, 0);
            }
            other => panic!("expected recorded answer, got {other:?}"),
        }
    }

    #[test]
    fn auto_reveal_fires_when_the_last_participant_answers() {
        let (mut room, host, players) = room_with_players(3);
        room.next_question(host, 0);

        for conn in &players[..2] {
            match room.submit_answer(*conn, 1, 1_000) {
                SubmitOutcome::Recorded { auto_reveal, .. } => assert!(auto_reveal.is_none()),
                other => panic!("expected recorded answer, got {other:?}"),
            }
        }

        match room.submit_answer(players[2], 1, 2_000) {
            SubmitOutcome::Recorded { auto_reveal, .. } => {
                assert!(auto_reveal.is_some());
            }
            other => panic!("expected recorded answer, got {other:?}"),
        }
        assert_eq!(room.phase(), RoomPhase::Reveal);
    }

    #[test]
    fn reveal_awards_speed_weighted_points_and_appends_history() {
        let (mut room, host, players) = room_with_players(2);
        room.next_question(host, 0);

        // Correct at half time vs wrong instantly.
        room.submit_answer(players[0], 1, 10_000);
        room.submit_answer(players[1], 0, 0);

        // All answered: the second submit auto-revealed.
        assert_eq!(room.history().len(), 1);
        let entry = &room.history()[0];
        assert_eq!(entry.index, 0);
        assert_eq!(entry.correct_index, 1);
        assert_eq!(entry.explanation.as_deref(), Some("because"));

        let fast = &entry.per_player[0];
        assert!(fast.correct);
        assert_eq!(fast.earned, 600);
        assert_eq!(fast.score, 600);
        assert_eq!(fast.time_ms, 10_000);

        let wrong = &entry.per_player[1];
        assert!(!wrong.correct);
        assert_eq!(wrong.earned, 0);
    }

    #[test]
    fn reveal_is_a_noop_outside_question_active() {
        let (mut room, host, _players) = room_with_players(1);
        assert!(room.reveal_requested(host).is_none());

        room.next_question(host, 0);
        assert!(room.reveal_requested(host).is_some());
        // Second reveal of the same question is dropped.
        assert!(room.reveal_requested(host).is_none());
    }

    #[test]
    fn advancing_past_the_last_question_finishes_the_game() {
        let (mut room, host, players) = room_with_players(1);
        room.next_question(host, 0);
        room.submit_answer(players[0], 1, 1_000);
        room.next_question(host, 2_000);
        room.submit_answer(players[0], 1, 3_000);

        match room.next_question(host, 4_000) {
            NextOutcome::GameOver { leaderboard } => {
                assert_eq!(leaderboard.len(), 1);
                assert!(leaderboard[0].score > 0);
            }
            other => panic!("expected game over, got {other:?}"),
        }
        assert_eq!(room.phase(), RoomPhase::GameOver);

        // Terminal: no further questions start.
        assert_eq!(room.next_question(host, 5_000), NextOutcome::Ignored);
    }

    #[test]
    fn leaderboard_ties_keep_join_order() {
        let (mut room, _host, _players) = room_with_players(0);
        room.join(Uuid::new_v4(), "zoe");
        room.join(Uuid::new_v4(), "ada");
        room.join(Uuid::new_v4(), "bob");

        let leaderboard = room.leaderboard();
        let names: Vec<&str> = leaderboard
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(names, ["zoe", "ada", "bob"]);
    }

    #[test]
    fn blank_names_become_the_placeholder() {
        let mut room = RoomSession::new("123456".into(), Uuid::new_v4());
        let joined = room.join(Uuid::new_v4(), "   ");
        assert_eq!(joined.name, ANONYMOUS_NAME);
    }

    #[test]
    fn resumed_sessions_seed_carried_scores_on_join() {
        let carried = HashMap::from([("ada".to_string(), 1450_i64)]);
        let history = vec![HistoryEntry {
            index: 2,
            question: "question 2".into(),
            correct_index: 0,
            explanation: None,
            per_player: Vec::new(),
        }];
        let mut room = RoomSession::resumed("654321".into(), history, carried);

        assert_eq!(room.current_index(), 2);
        assert!(room.host().is_none());

        let ada = room.join(Uuid::new_v4(), "ada");
        assert_eq!(ada.score, 1450);
        let newcomer = room.join(Uuid::new_v4(), "grace");
        assert_eq!(newcomer.score, 0);
        // Case-sensitive exact match only.
        let other = room.join(Uuid::new_v4(), "Ada");
        assert_eq!(other.score, 0);

        // The next advance moves past the last revealed question.
        let host = Uuid::new_v4();
        assert!(room.attach_host(host));
        assert!(room.load_questions(host, questions(4)));
        match room.next_question(host, 0) {
            NextOutcome::Question(start) => assert_eq!(start.index, 3),
            other => panic!("expected a question start, got {other:?}"),
        }
    }

    #[test]
    fn attach_binds_only_the_first_host() {
        let mut room = RoomSession::resumed("654321".into(), Vec::new(), HashMap::new());
        let first = Uuid::new_v4();
        assert!(room.attach_host(first));
        assert!(!room.attach_host(Uuid::new_v4()));
        assert_eq!(room.host(), Some(first));
    }

    #[test]
    fn snapshot_contains_names_but_never_connection_ids() {
        let (mut room, host, players) = room_with_players(2);
        room.next_question(host, 0);
        room.submit_answer(players[0], 1, 1_000);
        room.reveal_requested(host);

        let snapshot = room.snapshot(5_000, 10);
        assert_eq!(snapshot.pin, "123456");
        assert_eq!(snapshot.current_index, 0);
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.timestamp, 5_000);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains(&host.to_string()));
        for conn in &players {
            assert!(!json.contains(&conn.to_string()));
        }
    }

    #[test]
    fn snapshot_leaderboard_is_capped() {
        let (mut room, _host, _players) = room_with_players(5);
        let snapshot = room.snapshot(0, 3);
        assert_eq!(snapshot.leaderboard.len(), 3);
        room.mark_ended();
        assert_eq!(room.phase(), RoomPhase::Ended);
    }
}
