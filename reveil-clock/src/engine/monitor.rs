//! The evaluation loop.
//!
//! A single background task ticks the engine on a fixed interval.
//! Each tick takes the engine lock just long enough to compute the
//! transition, then applies any player side effect with a hard
//! timeout after the lock is released -- a stuck player must never
//! freeze the loop, or the alarm stops firing.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use super::{Engine, PlayerAction};
use crate::hw::{Clock, Display, Player};

const PLAYER_CALL_TIMEOUT: Duration = Duration::from_secs(5);

pub struct AlarmMonitor {
    engine: Arc<Mutex<Engine>>,
    clock: Arc<dyn Clock>,
    player: Arc<dyn Player>,
    display: Arc<dyn Display>,
    tick_interval: Duration,
}

impl AlarmMonitor {
    pub fn new(
        engine: Arc<Mutex<Engine>>,
        clock: Arc<dyn Clock>,
        player: Arc<dyn Player>,
        display: Arc<dyn Display>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            engine,
            clock,
            player,
            display,
            tick_interval,
        }
    }

    pub async fn run(self, cancellation: CancellationToken) {
        trace!("Alarm monitor started");
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }
        trace!("Alarm monitor stopped");
    }

    async fn tick(&self) {
        let now = self.clock.now();
        let action = self.engine.lock().tick(now);

        self.display.show_time(now);
        if let Some(action) = action {
            apply_player_action(&*self.player, &*self.display, action).await;
        }
    }
}

/// Apply a player side effect and mirror it on the display's alarm
/// indicator. Best-effort with a hard timeout: failures are logged
/// and the logical state stands (a silent alarm is still ringing).
pub async fn apply_player_action(player: &dyn Player, display: &dyn Display, action: PlayerAction) {
    let (result, indicator) = match &action {
        PlayerAction::Start { sound } => (
            tokio::time::timeout(PLAYER_CALL_TIMEOUT, player.start(sound)).await,
            true,
        ),
        PlayerAction::Stop => (
            tokio::time::timeout(PLAYER_CALL_TIMEOUT, player.stop()).await,
            false,
        ),
    };
    display.set_alarm_indicator(indicator);

    match result {
        Err(_) => warn!(?action, "Player call timed out"),
        Ok(Err(err)) => warn!(%err, ?action, "Player call failed, continuing"),
        Ok(Ok(())) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClockConfig;
    use crate::hw::{MockClock, MockDisplay, MockPlayer, PlayerEvent};
    use crate::store::testing::{empty_store, new_alarm};
    use crate::types::DayTag;
    use time::macros::{datetime, time};

    struct Fixture {
        monitor: AlarmMonitor,
        engine: Arc<Mutex<Engine>>,
        clock: Arc<MockClock>,
        player: Arc<MockPlayer>,
        display: Arc<MockDisplay>,
    }

    fn fixture() -> Fixture {
        let mut store = empty_store();
        store
            .add(new_alarm(time!(07:00), &[DayTag::Mon]))
            .unwrap();

        let engine = Arc::new(Mutex::new(Engine::new(store, &ClockConfig::default())));
        let clock = Arc::new(MockClock::starting_at(datetime!(2026-03-02 06:59)));
        let player = Arc::new(MockPlayer::default());
        let display = Arc::new(MockDisplay::default());

        let monitor = AlarmMonitor::new(
            engine.clone(),
            clock.clone(),
            player.clone(),
            display.clone(),
            Duration::from_secs(30),
        );

        Fixture {
            monitor,
            engine,
            clock,
            player,
            display,
        }
    }

    #[tokio::test]
    async fn fires_and_lights_the_indicator_on_the_due_minute() {
        let f = fixture();

        f.monitor.tick().await;
        assert!(f.player.events.lock().is_empty());

        f.clock.set(datetime!(2026-03-02 07:00));
        f.monitor.tick().await;

        assert_eq!(
            *f.player.events.lock(),
            vec![PlayerEvent::Started("default.mp3".into())]
        );
        assert!(*f.display.indicator.lock());
    }

    #[tokio::test]
    async fn player_failure_does_not_lose_the_logical_session() {
        let f = fixture();
        *f.player.fail_calls.lock() = true;

        f.clock.set(datetime!(2026-03-02 07:00));
        f.monitor.tick().await;

        // Audio failed, but the alarm is still logically ringing and
        // can be dismissed.
        assert!(f.engine.lock().is_ringing());
        assert!(f.engine.lock().dismiss().is_ok());
    }

    #[tokio::test]
    async fn snooze_re_rings_through_the_loop() {
        let f = fixture();

        f.clock.set(datetime!(2026-03-02 07:00));
        f.monitor.tick().await;

        let action = f.engine.lock().snooze(f.clock.now()).unwrap();
        apply_player_action(&*f.player, &*f.display, action).await;
        assert!(!*f.display.indicator.lock());

        f.clock.set(datetime!(2026-03-02 07:09));
        f.monitor.tick().await;

        assert_eq!(
            f.player.events.lock().last(),
            Some(&PlayerEvent::Started("default.mp3".into()))
        );
        assert!(*f.display.indicator.lock());
    }

    #[tokio::test(start_paused = true)]
    async fn run_ticks_until_cancelled() {
        let f = fixture();
        f.clock.set(datetime!(2026-03-02 07:00));

        let cancellation = CancellationToken::new();
        let player = f.player.clone();
        let handle = tokio::spawn(f.monitor.run(cancellation.clone()));

        // First interval tick fires immediately.
        tokio::time::advance(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;
        assert!(!player.events.lock().is_empty());

        cancellation.cancel();
        handle.await.unwrap();
    }
}
