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

/// How the server pretends to deliver the captured messages.
///
/// The mode is process-wide, set in the configuration and writable at
/// runtime through the admin surface.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub enum SimulationMode {
    /// every message is accepted.
    Success,
    /// every message is rejected with a permanent failure.
    Failure,
    /// ~30% of the messages are rejected with a transient failure.
    Random,
}

impl Default for SimulationMode {
    fn default() -> Self {
        Self::Success
    }
}

impl std::fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SimulationMode::Success => "success",
            SimulationMode::Failure => "failure",
            SimulationMode::Random => "random",
        })
    }
}

impl From<SimulationMode> for String {
    fn from(mode: SimulationMode) -> Self {
        format!("{}", mode)
    }
}

impl std::str::FromStr for SimulationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "random" => Ok(Self::Random),
            _ => anyhow::bail!("not a valid simulation mode: '{}'", s),
        }
    }
}

impl TryFrom<String> for SimulationMode {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        <Self as std::str::FromStr>::from_str(&value)
    }
}
