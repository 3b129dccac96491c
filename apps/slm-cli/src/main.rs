use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::{
    domain::SequenceEntry,
    error::ApiError,
    protocol::{
        AngleResponse, PositionResponse, RotatorVoltageResponse, SetAngleResponse,
        SetSequenceResponse, TriggerModeResponse, TriggerTypeResponse,
    },
};
use tokio::{io::AsyncWriteExt, net::TcpStream};

#[derive(Parser, Debug)]
struct Cli {
    /// Control surface of a running slm-server.
    #[arg(long, default_value = "http://127.0.0.1:8001")]
    server: String,
    /// Advance-pulse endpoint, used by `pulse`.
    #[arg(long, default_value = "127.0.0.1:4002")]
    pulse_addr: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assign a sequence; each entry is "angle,phase,wavelength".
    SetSequence { entries: Vec<String> },
    /// Print the current position in the series.
    Position,
    /// Jump to a position.
    Jump { position: usize },
    /// Print the diffraction angle at the current position.
    Angle,
    /// Resolve an angle back to a position and jump there.
    SetAngle { angle: f64 },
    /// Print the configured trigger type and mode.
    Trigger,
    /// Request a trigger configuration (only "software once" is accepted).
    SetTrigger {
        trigger_type: String,
        trigger_mode: String,
    },
    /// Fire the software trigger: one advance step.
    Fire,
    /// Send raw advance pulses over TCP, one per line.
    Pulse {
        #[arg(default_value_t = 1)]
        count: usize,
    },
    /// Set the rotator voltage.
    RotatorVoltage { voltage: f64 },
}

fn parse_entry(raw: &str) -> Result<SequenceEntry> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 3 {
        bail!("sequence entry '{raw}' is not of the form angle,phase,wavelength");
    }
    let parse = |part: &str, name: &str| {
        part.trim()
            .parse::<f64>()
            .with_context(|| format!("invalid {name} in sequence entry '{raw}'"))
    };
    Ok(SequenceEntry::new(
        parse(parts[0], "angle")?,
        parse(parts[1], "phase")?,
        parse(parts[2], "wavelength")?,
    ))
}

async fn checked(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    match response.json::<ApiError>().await {
        Ok(err) => bail!("server rejected the request ({status}): {}", err.message),
        Err(_) => bail!("server rejected the request ({status})"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let server = cli.server.trim_end_matches('/');

    match cli.command {
        Command::SetSequence { entries } => {
            let entries: Vec<SequenceEntry> = entries
                .iter()
                .map(|raw| parse_entry(raw))
                .collect::<Result<_>>()?;
            let response = client
                .post(format!("{server}/sequence"))
                .json(&serde_json::json!({ "entries": entries }))
                .send()
                .await?;
            let body: SetSequenceResponse = checked(response).await?.json().await?;
            println!("sequence assigned, {} patterns", body.len);
        }
        Command::Position => {
            let response = client.get(format!("{server}/position")).send().await?;
            let body: PositionResponse = checked(response).await?.json().await?;
            println!("position={}", body.position);
        }
        Command::Jump { position } => {
            let response = client
                .post(format!("{server}/position"))
                .json(&serde_json::json!({ "position": position }))
                .send()
                .await?;
            let body: PositionResponse = checked(response).await?.json().await?;
            println!("position={}", body.position);
        }
        Command::Angle => {
            let response = client.get(format!("{server}/angle")).send().await?;
            let body: AngleResponse = checked(response).await?.json().await?;
            println!("angle={}", body.angle);
        }
        Command::SetAngle { angle } => {
            let response = client
                .post(format!("{server}/angle"))
                .json(&serde_json::json!({ "angle": angle }))
                .send()
                .await?;
            let body: SetAngleResponse = checked(response).await?.json().await?;
            println!("position={} angle={}", body.position, body.angle);
        }
        Command::Trigger => {
            let response = client.get(format!("{server}/trigger/type")).send().await?;
            let ttype: TriggerTypeResponse = checked(response).await?.json().await?;
            let response = client.get(format!("{server}/trigger/mode")).send().await?;
            let tmode: TriggerModeResponse = checked(response).await?.json().await?;
            println!("trigger_type={:?} trigger_mode={:?}", ttype.trigger_type, tmode.trigger_mode);
        }
        Command::SetTrigger {
            trigger_type,
            trigger_mode,
        } => {
            let response = client
                .put(format!("{server}/trigger"))
                .json(&serde_json::json!({
                    "trigger_type": trigger_type,
                    "trigger_mode": trigger_mode,
                }))
                .send()
                .await?;
            checked(response).await?;
            println!("trigger configured");
        }
        Command::Fire => {
            let response = client.post(format!("{server}/trigger")).send().await?;
            let body: PositionResponse = checked(response).await?.json().await?;
            println!("position={}", body.position);
        }
        Command::Pulse { count } => {
            let mut stream = TcpStream::connect(&cli.pulse_addr)
                .await
                .with_context(|| format!("cannot connect to {}", cli.pulse_addr))?;
            for _ in 0..count {
                stream.write_all(b"next\n").await?;
            }
            stream.flush().await?;
            println!("sent {count} pulse(s) to {}", cli.pulse_addr);
        }
        Command::RotatorVoltage { voltage } => {
            let response = client
                .put(format!("{server}/rotator/voltage"))
                .json(&serde_json::json!({ "voltage": voltage }))
                .send()
                .await?;
            let body: RotatorVoltageResponse = checked(response).await?.json().await?;
            println!("voltage={}", body.voltage);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_entry() {
        let entry = parse_entry("60, 0, 450").expect("entry");
        assert_eq!(entry.angle, 60.0);
        assert_eq!(entry.phase, 0.0);
        assert_eq!(entry.wavelength, 450.0);
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(parse_entry("60,0").is_err());
        assert!(parse_entry("sixty,0,450").is_err());
    }
}
