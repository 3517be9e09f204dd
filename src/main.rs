// MIDI Timeline - Analyse a MIDI file and optionally simulate playback
// Run with: cargo run -- song.mid [--config tuning.ron] [--json] [--simulate 8]

use midi_timeline::{Config, MusicTimeline, PlaybackSession};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "Usage: midi-timeline <file.mid> [--config file.ron] [--json] [--simulate SECONDS]";

/// Simulated animation frame rate
const FRAME_RATE: f64 = 60.0;

#[derive(Debug, Default)]
struct Args {
    midi_path: PathBuf,
    config_path: Option<PathBuf>,
    json: bool,
    simulate: Option<f64>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut midi_path = None;
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => args.json = true,
            "--config" => {
                let path = iter.next().ok_or("--config needs a file")?;
                args.config_path = Some(PathBuf::from(path));
            }
            "--simulate" => {
                let seconds = iter.next().ok_or("--simulate needs a duration")?;
                let seconds: f64 = seconds
                    .parse()
                    .map_err(|_| format!("invalid duration: {}", seconds))?;
                args.simulate = Some(seconds);
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            other if other.starts_with("--") => return Err(format!("unknown option: {}", other)),
            other => midi_path = Some(PathBuf::from(other)),
        }
    }

    args.midi_path = midi_path.ok_or(USAGE)?;
    Ok(args)
}

fn print_summary(timeline: &MusicTimeline) {
    println!("🎵 {}", timeline.name());
    println!("   - Key: {}", timeline.key());
    println!(
        "   - Tempo: {:.1} BPM ({} tempo events)",
        timeline.tempo(),
        timeline.tempo_events().len()
    );
    if timeline.tempo_events().len() > 1 {
        for event in timeline.tempo_events() {
            println!("       {:>8.3}s  {}", event.time, event.tempo());
        }
    }
    println!("   - Time signature: {}", timeline.time_signature());
    println!("   - Duration: {:.2} s", timeline.duration());
    println!(
        "   - Notes: {} ({} drum hits)",
        timeline.notes().len(),
        timeline.drums().len()
    );

    println!("\nChords:");
    for chord in timeline.chords() {
        println!(
            "   {:>8.3}s  {:<8} {:<6} tension {:.2}",
            chord.time,
            chord.name(timeline.use_flats()),
            chord.numeral,
            chord.tension
        );
    }
}

fn simulate(timeline: &MusicTimeline, config: &Config, seconds: f64) {
    let mut session = PlaybackSession::new(timeline, config.mapper);
    let dt = 1.0 / FRAME_RATE;
    let frames = (seconds.max(0.0) * FRAME_RATE).round() as u64;

    println!("\n▶️  Simulating {:.1} s at {} fps", seconds, FRAME_RATE);
    for frame in 1..=frames {
        let time = frame as f64 / FRAME_RATE;
        let params = session.frame(time, dt);

        if params.beat.on_bar {
            println!(
                "   {:>8.3}s  bar {:<4} {:.1} BPM  drums {:.2}",
                time,
                params.beat.total_bars.floor() as u64 + 1,
                params.beat.bpm,
                params.drum_energy
            );
        }
        if params.chord_changed {
            let name = timeline
                .chord_at(time)
                .map(|c| c.name(timeline.use_flats()))
                .unwrap_or_else(|| "N.C.".to_string());
            let next = params
                .next_chord_in
                .map(|s| format!("next in {:.2} s", s))
                .unwrap_or_else(|| "last chord".to_string());
            println!(
                "   {:>8.3}s  chord {:<8} tension {:.2}  {}",
                time, name, params.chord_tension, next
            );
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };

    let config = match &args.config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.validate()?;

    info!(path = %args.midi_path.display(), "analysing MIDI file");
    let timeline = MusicTimeline::load(&args.midi_path, &config.analysis)?;

    if args.json {
        println!("{}", timeline.to_json()?);
    } else {
        print_summary(&timeline);
    }

    if let Some(seconds) = args.simulate {
        simulate(&timeline, &config, seconds);
    }

    Ok(())
}
