//! Robot controller aggregate
//!
//! `RobotController` owns the mode, the commanded actuator state and every
//! sub-component. It is driven from a single polling loop:
//!
//! 1. operator requests are applied with [`RobotController::request`]
//! 2. [`RobotController::tick`] runs interlock, schedule, then player and
//!    accessories, and returns the accumulated [`Effects`]
//!
//! The controller never touches hardware. Effects describe what the
//! actuator facade, buzzer, indicator and storage should do.

use heapless::Vec;

use attendant_protocol::{Command, Packet, RejectCode, Reply, StatusReport};

use crate::accessory::{AlertTone, HelpAlert, WiperSweep};
use crate::config::RobotConfig;
use crate::mode::{Mode, ModeEvent, ModeKind};
use crate::safety::{Interlock, InterlockEvent, RangeReading};
use crate::schedule::{ScheduleTrigger, WallTime};
use crate::sequence::frame::clamp_angle;
use crate::sequence::{
    ActuatorTargets, DriveCommand, DrivePreset, Player, Recorder, SequenceStore, StepResult,
    AXIS_COUNT, WIPER_CHANNEL,
};
use crate::status::{Indicator, StatusSnapshot};

/// Why a request was refused
///
/// A rejected request never changes any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    /// Not allowed in the current mode
    WrongMode,
    /// Routine has no frames
    EmptySequence,
    /// Routine is full; nothing captured
    CapacityExceeded,
    /// Frame duration of zero
    InvalidDuration,
    /// No such servo channel
    InvalidChannel,
    /// Interlock is holding the robot
    ObstacleActive,
    /// Unknown routine or preset code
    InvalidArgument,
    /// No wall clock fitted
    ClockUnavailable,
}

impl From<Rejection> for RejectCode {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::WrongMode => RejectCode::WrongMode,
            Rejection::EmptySequence => RejectCode::EmptySequence,
            Rejection::CapacityExceeded => RejectCode::CapacityExceeded,
            Rejection::InvalidDuration => RejectCode::InvalidDuration,
            Rejection::InvalidChannel => RejectCode::InvalidChannel,
            Rejection::ObstacleActive => RejectCode::ObstacleActive,
            Rejection::InvalidArgument => RejectCode::InvalidArgument,
            Rejection::ClockUnavailable => RejectCode::ClockUnavailable,
        }
    }
}

/// Operator requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    TeachStart(ModeKind),
    /// Capture a frame; `None` uses the configured default duration
    TeachStep(Option<u16>),
    TeachEnd,
    Play(ModeKind),
    Stop,
    SetServo { channel: u8, angle: u8 },
    SetDrive(DriveCommand),
    Drive(DrivePreset),
    Help,
    Status,
    SetTime(WallTime),
}

impl Request {
    /// Map a link packet to a request
    ///
    /// Unknown verbs and malformed arguments are both `InvalidArgument`.
    pub fn from_packet(packet: &Packet) -> Result<Self, Rejection> {
        let cmd = Command::from_packet(packet).map_err(|_| Rejection::InvalidArgument)?;
        Self::from_command(cmd)
    }

    /// Map a link command to a request
    pub fn from_command(cmd: Command) -> Result<Self, Rejection> {
        let kind = |k: u8| ModeKind::from_index(k).ok_or(Rejection::InvalidArgument);

        let req = match cmd {
            Command::TeachStart { kind: k } => Request::TeachStart(kind(k)?),
            Command::TeachStep { duration_ms } => Request::TeachStep(duration_ms),
            Command::TeachEnd => Request::TeachEnd,
            Command::Play { kind: k } => Request::Play(kind(k)?),
            Command::Stop => Request::Stop,
            Command::SetServo { channel, angle } => Request::SetServo { channel, angle },
            Command::SetDrive { left, right } => Request::SetDrive(DriveCommand::new(left, right)),
            Command::Drive { preset } => {
                Request::Drive(DrivePreset::from_u8(preset).ok_or(Rejection::InvalidArgument)?)
            }
            Command::Help => Request::Help,
            Command::Status => Request::Status,
            Command::SetTime {
                hour,
                minute,
                second,
            } => Request::SetTime(
                WallTime::new(hour, minute, second).ok_or(Rejection::InvalidArgument)?,
            ),
        };
        Ok(req)
    }
}

/// Result of an accepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Accepted,
    /// Frame captured; new frame count
    Captured(usize),
    /// Status query answer
    Status(StatusReport),
}

impl Outcome {
    /// Link reply for a request result
    pub fn reply(result: Result<Outcome, Rejection>) -> Reply {
        match result {
            Ok(Outcome::Status(report)) => Reply::Status(report),
            Ok(_) => Reply::Accept,
            Err(r) => Reply::Reject(r.into()),
        }
    }
}

/// Sensor inputs for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sensors {
    /// Latest range reading
    pub range: RangeReading,
    /// Wall-clock time, if the clock could be read
    pub wall: Option<WallTime>,
}

/// Side effects accumulated since they were last taken
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Effects {
    /// New commanded arm pose and wheel speeds
    pub actuators: Option<ActuatorTargets>,
    /// New wiper angle
    pub wiper: Option<u8>,
    /// New buzzer state
    pub buzzer: Option<bool>,
    /// Mode after the last transition
    pub mode_changed: Option<Mode>,
    /// Sequences that must be written to storage
    pub persist: Vec<ModeKind, 4>,
    /// Routine started by the schedule
    pub scheduled: Option<ModeKind>,
    /// Time to write to the wall clock
    pub clock: Option<WallTime>,
}

impl Effects {
    /// Check if nothing needs doing
    pub fn is_empty(&self) -> bool {
        *self == Effects::default()
    }
}

/// Top-level controller
pub struct RobotController {
    config: RobotConfig,
    mode: Mode,
    commanded: ActuatorTargets,
    buzzer_on: bool,
    store: SequenceStore,
    recorder: Recorder,
    player: Player,
    schedule: ScheduleTrigger,
    interlock: Interlock,
    alert: HelpAlert,
    wiper: WiperSweep,
    last_time: Option<WallTime>,
    pending: Effects,
}

impl RobotController {
    /// Create a controller in Idle with the arm at its home pose
    ///
    /// `store` holds the sequences loaded from storage.
    pub fn new(config: RobotConfig, mut store: SequenceStore) -> Self {
        if config.seed_demo_cleaning {
            store.seed_demo_cleaning();
        }

        let home = ActuatorTargets::at_pose(config.home_pose);
        let mut wiper = WiperSweep::new(config.wiper);
        let park = wiper.park();

        let pending = Effects {
            actuators: Some(home),
            wiper: Some(park),
            buzzer: Some(false),
            mode_changed: Some(Mode::Idle),
            ..Effects::default()
        };

        Self {
            schedule: ScheduleTrigger::new(&config.schedule),
            interlock: Interlock::new(config.obstacle_threshold_cm),
            alert: HelpAlert::new(config.alert),
            wiper,
            config,
            mode: Mode::Idle,
            commanded: home,
            buzzer_on: false,
            store,
            recorder: Recorder::new(),
            player: Player::new(),
            last_time: None,
            pending,
        }
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Currently commanded actuator state
    pub fn commanded(&self) -> ActuatorTargets {
        self.commanded
    }

    /// Sequence store
    pub fn store(&self) -> &SequenceStore {
        &self.store
    }

    /// Active configuration
    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Check if the interlock is holding the robot
    pub fn interlock_active(&self) -> bool {
        self.interlock.is_active()
    }

    /// Indicator color for the current mode
    pub fn indicator(&self) -> Indicator {
        Indicator::for_mode(self.mode)
    }

    /// Turn scheduling off (clock unavailable at startup)
    pub fn disable_schedule(&mut self) {
        self.schedule.disable();
    }

    /// Check if scheduling is on
    pub fn schedule_enabled(&self) -> bool {
        self.schedule.is_enabled()
    }

    /// Take the effects accumulated so far
    pub fn take_effects(&mut self) -> Effects {
        core::mem::take(&mut self.pending)
    }

    /// Apply an operator request
    pub fn request(&mut self, req: Request, now_ms: u64) -> Result<Outcome, Rejection> {
        match req {
            Request::TeachStart(kind) => {
                self.transition(ModeEvent::StartTeach(kind))?;
                self.recorder.start(&mut self.store, kind);
                Ok(Outcome::Accepted)
            }
            Request::TeachStep(duration_ms) => {
                if !matches!(self.mode, Mode::Teaching(_)) {
                    return Err(self.refusal());
                }
                let duration = duration_ms.unwrap_or(self.config.default_frame_ms);
                let count = self
                    .recorder
                    .capture(&mut self.store, self.commanded, duration)?;
                Ok(Outcome::Captured(count))
            }
            Request::TeachEnd => {
                self.transition(ModeEvent::EndTeach)?;
                if let Some(kind) = self.recorder.finish() {
                    self.persist(kind);
                }
                self.halt();
                Ok(Outcome::Accepted)
            }
            Request::Play(kind) => {
                if self.mode == Mode::ObstacleStop {
                    return Err(Rejection::ObstacleActive);
                }
                if self.mode != Mode::Idle {
                    return Err(Rejection::WrongMode);
                }
                if self.store.get(kind).is_empty() {
                    return Err(Rejection::EmptySequence);
                }
                self.start_play(kind, now_ms)?;
                Ok(Outcome::Accepted)
            }
            Request::Stop => {
                self.cancel();
                Ok(Outcome::Accepted)
            }
            Request::SetServo { channel, angle } => {
                self.check_manual_motion()?;
                let angle = clamp_angle(angle);
                match channel as usize {
                    c if c < AXIS_COUNT => {
                        let mut targets = self.commanded;
                        targets.angles[c] = angle;
                        self.command(targets);
                    }
                    _ if channel == WIPER_CHANNEL => self.pending.wiper = Some(angle),
                    _ => return Err(Rejection::InvalidChannel),
                }
                Ok(Outcome::Accepted)
            }
            Request::SetDrive(drive) => {
                self.check_manual_motion()?;
                let mut targets = self.commanded;
                targets.drive = drive;
                self.command(targets);
                Ok(Outcome::Accepted)
            }
            Request::Drive(preset) => self.request(Request::SetDrive(preset.command()), now_ms),
            Request::Help => {
                self.transition(ModeEvent::HelpRequested)?;
                self.recorder.abandon(&mut self.store);
                self.player.clear();
                self.park_wiper();
                self.halt();
                self.alert.start(now_ms);
                Ok(Outcome::Accepted)
            }
            Request::Status => Ok(Outcome::Status(self.status_report())),
            Request::SetTime(time) => {
                if !self.schedule.is_enabled() {
                    return Err(Rejection::ClockUnavailable);
                }
                self.last_time = Some(time);
                self.pending.clock = Some(time);
                Ok(Outcome::Accepted)
            }
        }
    }

    /// Run one polling cycle: interlock, schedule, player, accessories
    pub fn tick(&mut self, now_ms: u64, sensors: Sensors) -> Effects {
        self.poll_interlock(now_ms, sensors.range);
        self.poll_schedule(now_ms, sensors.wall);
        self.step_player(now_ms);
        self.step_accessories(now_ms);
        self.take_effects()
    }

    /// Snapshot for the display
    pub fn snapshot(&self) -> StatusSnapshot {
        let (frame_index, frame_count) = self.progress();
        StatusSnapshot {
            mode: self.mode,
            time: self.last_time,
            distance: self.interlock.last_reading(),
            frame_count,
            frame_index,
        }
    }

    /// Status report for the link
    pub fn status_report(&self) -> StatusReport {
        let (frame_index, frame_count) = self.progress();
        let mode = match self.mode {
            Mode::Idle => 0,
            Mode::Teaching(_) => 1,
            Mode::Playing(_) => 2,
            Mode::ObstacleStop => 3,
            Mode::HelpAlert => 4,
        };
        let distance_cm = self
            .interlock
            .last_reading()
            .and_then(|r| r.cm())
            .unwrap_or(attendant_protocol::messages::NO_DISTANCE);

        StatusReport {
            mode,
            kind: self
                .mode
                .kind()
                .map_or(attendant_protocol::messages::NO_KIND, |k| k as u8),
            frame_index: frame_index as u8,
            frame_count: frame_count as u8,
            distance_cm,
        }
    }

    fn progress(&self) -> (usize, usize) {
        let count = self.mode.kind().map_or(0, |k| self.store.get(k).len());
        let index = self.player.cursor().map_or(0, |c| c.index);
        (index, count)
    }

    fn poll_interlock(&mut self, now_ms: u64, range: RangeReading) {
        match self.interlock.poll(range, self.mode) {
            Some(InterlockEvent::Engaged) => {
                self.player.suspend(now_ms);
                self.park_wiper();
                self.alert.cancel();
                self.set_buzzer(false);
                self.halt();
                self.force(ModeEvent::ObstacleDetected);
            }
            Some(InterlockEvent::Cleared(saved)) => {
                self.force(ModeEvent::ObstacleCleared(saved));
                match saved {
                    Mode::Playing(kind) => {
                        if let Some(targets) = self.player.resume(now_ms, self.store.get(kind)) {
                            self.command(targets);
                        }
                        if kind == ModeKind::Cleaning {
                            self.wiper.start(now_ms);
                        }
                    }
                    Mode::HelpAlert => self.alert.start(now_ms),
                    _ => {}
                }
            }
            None => {}
        }
    }

    fn poll_schedule(&mut self, now_ms: u64, wall: Option<WallTime>) {
        let Some(wall) = wall else {
            return;
        };
        self.last_time = Some(wall);

        let due = self.schedule.check(&wall);
        if self.mode != Mode::Idle {
            return;
        }

        let first = due
            .iter()
            .copied()
            .find(|kind| !self.store.get(*kind).is_empty());

        if let Some(kind) = first {
            if self.start_play(kind, now_ms).is_ok() {
                self.pending.scheduled = Some(kind);
            }
        }
    }

    fn step_player(&mut self, now_ms: u64) {
        let Mode::Playing(kind) = self.mode else {
            return;
        };

        match self.player.step(now_ms, self.store.get(kind)) {
            StepResult::Applied { targets, .. } => self.command(targets),
            StepResult::Finished => {
                self.park_wiper();
                self.halt();
                self.force(ModeEvent::PlaybackFinished);
            }
            StepResult::Holding | StepResult::Idle => {}
        }
    }

    fn step_accessories(&mut self, now_ms: u64) {
        if self.mode == Mode::Playing(ModeKind::Cleaning) {
            if let Some(angle) = self.wiper.update(now_ms) {
                self.pending.wiper = Some(angle);
            }
        }

        if self.mode == Mode::HelpAlert {
            match self.alert.poll(now_ms) {
                AlertTone::On => self.set_buzzer(true),
                AlertTone::Off => self.set_buzzer(false),
                AlertTone::Finished => {
                    self.set_buzzer(false);
                    self.force(ModeEvent::AlertFinished);
                }
            }
        }
    }

    fn start_play(&mut self, kind: ModeKind, now_ms: u64) -> Result<(), Rejection> {
        self.transition(ModeEvent::StartPlay(kind))?;
        self.player.start(kind, now_ms);
        if kind == ModeKind::Cleaning {
            self.wiper.start(now_ms);
        }
        Ok(())
    }

    /// Cancel from any mode
    fn cancel(&mut self) {
        self.recorder.abandon(&mut self.store);
        self.player.clear();
        self.alert.cancel();
        self.set_buzzer(false);
        self.park_wiper();

        if self.mode == Mode::ObstacleStop {
            // Hold position; clearance now returns to Idle
            self.interlock.cancel_saved();
            self.halt();
        } else {
            self.command(ActuatorTargets::at_pose(self.config.home_pose));
        }

        self.force(ModeEvent::Stop);
    }

    fn check_manual_motion(&self) -> Result<(), Rejection> {
        if self.mode.manual_motion_allowed() {
            Ok(())
        } else {
            Err(self.refusal())
        }
    }

    fn refusal(&self) -> Rejection {
        if self.mode == Mode::ObstacleStop {
            Rejection::ObstacleActive
        } else {
            Rejection::WrongMode
        }
    }

    /// Apply a transition, rejecting if the table does not allow it
    fn transition(&mut self, event: ModeEvent) -> Result<Mode, Rejection> {
        let next = self.mode.transition(event).ok_or_else(|| self.refusal())?;
        if next != self.mode {
            self.mode = next;
            self.pending.mode_changed = Some(next);
        }
        Ok(next)
    }

    /// Apply a transition that is valid by construction
    fn force(&mut self, event: ModeEvent) {
        let _ = self.transition(event);
    }

    fn command(&mut self, targets: ActuatorTargets) {
        self.commanded = targets;
        self.pending.actuators = Some(targets);
    }

    fn halt(&mut self) {
        if !self.commanded.drive.is_stopped() {
            self.command(self.commanded.halted());
        }
    }

    fn park_wiper(&mut self) {
        if self.wiper.is_running() {
            self.pending.wiper = Some(self.wiper.park());
        }
    }

    fn set_buzzer(&mut self, on: bool) {
        if self.buzzer_on != on {
            self.buzzer_on = on;
            self.pending.buzzer = Some(on);
        }
    }

    fn persist(&mut self, kind: ModeKind) {
        if !self.pending.persist.contains(&kind) {
            // One slot per kind
            let _ = self.pending.persist.push(kind);
        }
    }
}
