//! Host collaborator
//!
//! The session only needs two things from its host: the name of the attached
//! device and a way to send sysex to it. [`MidiHost`] provides both over a
//! pair of `midir` ports.

use anyhow::{Context, Result};
use colored::*;
use midir::{MidiInput, MidiInputConnection, MidiInputPort, MidiOutput, MidiOutputConnection, MidiOutputPort};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::MidiConfig;
use crate::midi::{format_hex, RawEvent};

const CLIENT_NAME: &str = "ctrlsurf";

pub trait Host {
    /// Name the attached device reports, usually its port name
    fn device_name(&self) -> String;

    /// Send a sysex message to the device
    fn send_sysex(&mut self, data: &[u8]);
}

/// Host backed by a MIDI input/output port pair
pub struct MidiHost {
    device_name: String,
    /// Kept alive for the input callback
    _input_conn: MidiInputConnection<()>,
    output_conn: MidiOutputConnection,
}

impl MidiHost {
    /// Connect to the configured ports, forwarding parsed input into `event_tx`
    pub fn connect(config: &MidiConfig, event_tx: mpsc::Sender<RawEvent>) -> Result<Self> {
        info!(
            "Connecting - Input: '{}', Output: '{}'",
            config.input_port, config.output_port
        );

        let midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;
        debug!("Found {} MIDI input ports", midi_in.port_count());

        let (in_port, device_name) = find_input_port(&midi_in, &config.input_port)
            .ok_or_else(|| anyhow::anyhow!("Input port '{}' not found", config.input_port))?;
        info!("Connecting to input port: {}", device_name);

        let input_conn = midi_in
            .connect(
                &in_port,
                CLIENT_NAME,
                move |_timestamp, data, _| match RawEvent::from_bytes(data) {
                    Some(event) => {
                        // Never block the MIDI thread
                        let _ = event_tx.try_send(event);
                    }
                    None => debug!("Failed to parse MIDI: {}", format_hex(data)),
                },
                (),
            )
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context("Failed to connect to input port")?;

        let midi_out = MidiOutput::new(CLIENT_NAME).context("Failed to create MIDI output")?;
        debug!("Found {} MIDI output ports", midi_out.port_count());

        let (out_port, out_name) = find_output_port(&midi_out, &config.output_port)
            .ok_or_else(|| anyhow::anyhow!("Output port '{}' not found", config.output_port))?;
        info!("Connecting to output port: {}", out_name);

        let output_conn = midi_out
            .connect(&out_port, CLIENT_NAME)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context("Failed to connect to output port")?;

        Ok(Self {
            device_name,
            _input_conn: input_conn,
            output_conn,
        })
    }
}

impl Host for MidiHost {
    fn device_name(&self) -> String {
        self.device_name.clone()
    }

    fn send_sysex(&mut self, data: &[u8]) {
        match self.output_conn.send(data) {
            Ok(()) => debug!("Sent: {}", format_hex(data)),
            Err(e) => warn!("Failed to send sysex {}: {}", format_hex(data), e),
        }
    }
}

/// Case-insensitive substring match, first port wins
fn find_input_port(midi_in: &MidiInput, pattern: &str) -> Option<(MidiInputPort, String)> {
    let pattern = pattern.to_lowercase();
    midi_in.ports().into_iter().find_map(|port| {
        let name = midi_in.port_name(&port).ok()?;
        if name.to_lowercase().contains(&pattern) {
            debug!("Found port '{}' matching pattern '{}'", name, pattern);
            Some((port, name))
        } else {
            None
        }
    })
}

fn find_output_port(midi_out: &MidiOutput, pattern: &str) -> Option<(MidiOutputPort, String)> {
    let pattern = pattern.to_lowercase();
    midi_out.ports().into_iter().find_map(|port| {
        let name = midi_out.port_name(&port).ok()?;
        if name.to_lowercase().contains(&pattern) {
            debug!("Found port '{}' matching pattern '{}'", name, pattern);
            Some((port, name))
        } else {
            None
        }
    })
}

/// Names of the available input and output ports
pub fn discover_ports() -> Result<(Vec<String>, Vec<String>)> {
    let midi_in = MidiInput::new(CLIENT_NAME)?;
    let inputs = midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect();

    let midi_out = MidiOutput::new(CLIENT_NAME)?;
    let outputs = midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();

    Ok((inputs, outputs))
}

fn is_virtual(name: &str) -> bool {
    name.contains("Virtual") || name.contains("loopMIDI") || name.contains("IAC")
}

/// Print the available ports
pub fn print_ports() -> Result<()> {
    let (inputs, outputs) = discover_ports()?;

    println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());
    for (title, ports) in [("Input Ports:", inputs), ("Output Ports:", outputs)] {
        println!("\n{}", title.bold());
        if ports.is_empty() {
            println!("  {}", "None found".dimmed());
        }
        for name in ports {
            let marker = if is_virtual(&name) {
                "[VIRTUAL]".yellow()
            } else {
                "[PHYSICAL]".green()
            };
            println!("  {} {}", marker, name);
        }
    }
    println!();
    Ok(())
}

#[cfg(test)]
pub(crate) mod mock {
    use super::Host;

    /// Host with a fixed device name that records what it was asked to send
    #[derive(Debug, Default)]
    pub struct MockHost {
        pub name: String,
        pub sent: Vec<Vec<u8>>,
    }

    impl MockHost {
        pub fn named(name: &str) -> Self {
            Self {
                name: name.to_string(),
                sent: Vec::new(),
            }
        }
    }

    impl Host for MockHost {
        fn device_name(&self) -> String {
            self.name.clone()
        }

        fn send_sysex(&mut self, data: &[u8]) {
            self.sent.push(data.to_vec());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_port_names() {
        assert!(is_virtual("loopMIDI Port 1"));
        assert!(is_virtual("IAC Driver Bus 1"));
        assert!(!is_virtual("Launchkey MK2 49"));
    }
}
