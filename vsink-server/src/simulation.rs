/*
 * vSink mail capture server
 * Copyright (C) 2022 the vSink authors
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/
use vsink_common::SimulationMode;
use vsink_store::DeliveryStatus;

/// What the policy decided for one message.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Verdict {
    /// deliver normally: `250 OK: Message queued`.
    Accept,
    /// pretend a permanent delivery failure.
    Permanent,
    /// pretend a transient delivery failure, the client is expected to retry.
    Temporary,
}

impl Verdict {
    /// the status recorded on the persisted message.
    #[must_use]
    pub const fn status(self) -> DeliveryStatus {
        match self {
            Verdict::Accept => DeliveryStatus::Success,
            Verdict::Permanent => DeliveryStatus::Permanent,
            Verdict::Temporary => DeliveryStatus::Temporary,
        }
    }

    /// the reason sent to the client and stored with the message.
    #[must_use]
    pub const fn failure_reason(self) -> Option<&'static str> {
        match self {
            Verdict::Accept => None,
            Verdict::Permanent => Some("Simulated failure"),
            Verdict::Temporary => Some("Simulated temporary failure"),
        }
    }
}

/// Delivery simulation, evaluated once per message at the end of DATA.
///
/// The mode is shared with the admin surface: reads are frequent (one per
/// message), writes rare. The generator is seeded once per policy so a
/// seeded instance replays the same verdict sequence.
pub struct SimulationPolicy {
    mode: std::sync::RwLock<SimulationMode>,
    rng: std::sync::Mutex<fastrand::Rng>,
}

impl SimulationPolicy {
    ///
    #[must_use]
    pub fn new(mode: SimulationMode) -> Self {
        Self {
            mode: std::sync::RwLock::new(mode),
            rng: std::sync::Mutex::new(fastrand::Rng::new()),
        }
    }

    /// a policy with a reproducible verdict sequence.
    #[must_use]
    pub fn with_seed(mode: SimulationMode, seed: u64) -> Self {
        Self {
            mode: std::sync::RwLock::new(mode),
            rng: std::sync::Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }

    /// the current mode.
    #[must_use]
    pub fn mode(&self) -> SimulationMode {
        *self.mode.read().expect("simulation mode lock poisoned")
    }

    /// switch the mode, effective for the next message of every session.
    pub fn set_mode(&self, mode: SimulationMode) {
        *self.mode.write().expect("simulation mode lock poisoned") = mode;
    }

    /// decide the fate of one message.
    #[must_use]
    pub fn evaluate(&self) -> Verdict {
        match self.mode() {
            SimulationMode::Success => Verdict::Accept,
            SimulationMode::Failure => Verdict::Permanent,
            SimulationMode::Random => {
                // 3 chances in 10, as advertised to the clients under test.
                let roll = self.rng.lock().expect("rng lock poisoned").u32(0..10);
                if roll < 3 {
                    Verdict::Temporary
                } else {
                    Verdict::Accept
                }
            }
        }
    }
}
