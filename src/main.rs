use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use courtside::capture::{load_frame, FrameSource, ImageSequence};
use courtside::geometry::FIELD_MARGIN;
use courtside::output::{ImageDirSink, OutputSink};
use courtside::{
    Error, FieldBoundary, FieldExtractor, GeometryFilter, MotionStream, Side, Strategy,
    StreamSettings,
};
use image::Rgb;
use imageproc::point::Point;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect motion over a directory of frames
    Motion {
        /// Directory of frame images, ordered by file name
        #[arg(short, long)]
        frames: PathBuf,

        /// Background-modelling strategy
        #[arg(short, long, value_enum, default_value_t = StrategyArg::FrameDifferencing)]
        strategy: StrategyArg,

        /// Background plate (required by every strategy but frame differencing)
        #[arg(short, long)]
        background: Option<PathBuf>,

        /// Blend coefficient for the adaptive strategies
        #[arg(long, default_value_t = 0.05)]
        alpha: f32,

        /// Frames between reference refreshes for frame differencing
        #[arg(long, default_value_t = 1)]
        time_window: u32,

        /// Field polygon as "x,y x,y x,y ..."; defaults to the built-in court
        #[arg(long, value_parser = parse_polygon)]
        field: Option<Polygon>,

        /// Margin the field polygon is grown by
        #[arg(long, default_value_t = FIELD_MARGIN)]
        margin: f64,

        /// Directory for annotated frames
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract the playing field from a single frame
    Field {
        /// Frame image
        #[arg(short, long)]
        frame: PathBuf,

        /// Which side of the court the frame shows
        #[arg(short, long, value_enum)]
        side: SideArg,

        /// Boundary line colour as "R,G,B"
        #[arg(long, value_parser = parse_color, default_value = "22,63,177")]
        line_color: Rgb<u8>,

        /// Allowed hue distance from the line colour
        #[arg(long, default_value_t = 8)]
        tolerance: u8,

        /// Directory for field.png and mask.png
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    FrameDifferencing,
    StaticBackground,
    AdaptiveBackground,
    RunningAverage,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::FrameDifferencing => Strategy::FrameDifferencing,
            StrategyArg::StaticBackground => Strategy::StaticBackground,
            StrategyArg::AdaptiveBackground => Strategy::AdaptiveBackground,
            StrategyArg::RunningAverage => Strategy::RunningAverage,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for Side {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Left => Side::Left,
            SideArg::Right => Side::Right,
        }
    }
}

#[derive(Clone, Debug)]
struct Polygon(Vec<Point<f64>>);

fn parse_polygon(s: &str) -> Result<Polygon, String> {
    s.split_whitespace()
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| format!("expected x,y but got {:?}", pair))?;
            let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
            let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
            Ok(Point::new(x, y))
        })
        .collect::<Result<Vec<_>, String>>()
        .map(Polygon)
}

fn parse_color(s: &str) -> Result<Rgb<u8>, String> {
    let channels = s
        .split(',')
        .map(|c| c.trim().parse::<u8>().map_err(|e| e.to_string()))
        .collect::<Result<Vec<u8>, String>>()?;

    match channels[..] {
        [r, g, b] => Ok(Rgb([r, g, b])),
        _ => Err(format!("expected R,G,B but got {:?}", s)),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("courtside starting");

    match args.command {
        Command::Motion {
            frames,
            strategy,
            background,
            alpha,
            time_window,
            field,
            margin,
            output,
        } => {
            let source = ImageSequence::open(&frames)?;

            let boundary = match field {
                Some(Polygon(vertices)) => FieldBoundary::new(vertices, margin)
                    .context("Invalid field polygon")?,
                None => FieldBoundary::default(),
            };

            let background = background
                .map(load_frame)
                .transpose()
                .context("Failed to load background")?;

            let settings = StreamSettings { alpha, time_window };
            let stream = MotionStream::new(
                strategy.into(),
                GeometryFilter::new(boundary),
                background,
                settings,
            )
            .context("Failed to set up motion stream")?;

            let mut sink = output.map(ImageDirSink::new).transpose()?;

            run_motion(&source, stream, sink.as_mut())
        }
        Command::Field {
            frame,
            side,
            line_color,
            tolerance,
            output,
        } => {
            let frame = load_frame(&frame)?;
            let extractor = FieldExtractor::new(line_color, tolerance);

            let extraction = extractor
                .extract(&frame, side.into())
                .context("Failed to extract field")?;

            let mut sink = ImageDirSink::new(&output)?;
            sink.write_frame("field", &extraction.field)?;
            sink.write_mask("mask", &extraction.mask)?;

            let outline: Vec<String> = extraction
                .outline
                .iter()
                .map(|p| format!("{},{}", p.x, p.y))
                .collect();
            tracing::info!("Field outline: {}", outline.join(" "));

            Ok(())
        }
    }
}

fn run_motion<S, O>(source: &S, mut stream: MotionStream, mut sink: Option<&mut O>) -> Result<()>
where
    S: FrameSource,
    O: OutputSink,
{
    let mut total_time = Duration::ZERO;
    let mut total_boxes = 0usize;

    tracing::info!(
        "Processing {} frames with {}",
        source.len(),
        stream.strategy()
    );

    for index in 0..source.len() {
        let frame = source
            .get_frame(index)
            .with_context(|| format!("Failed to load frame {}", index))?;

        let start = Instant::now();
        let detection = match stream.process(&frame) {
            Err(Error::StateCorruption { stored, found }) => {
                tracing::warn!(
                    "Frame {} is {:?}, model is {:?}; resetting",
                    index,
                    found,
                    stored
                );
                stream.reset();
                stream.process(&frame)
            }
            other => other,
        }
        .with_context(|| format!("Failed to process frame {}", index))?;
        total_time += start.elapsed();

        total_boxes += detection.boxes.len();
        for b in &detection.boxes {
            tracing::debug!(
                "Frame {}: motion at ({}, {}) {}x{}",
                index,
                b.x,
                b.y,
                b.width,
                b.height
            );
        }

        if let Some(sink) = sink.as_mut() {
            sink.write_frame(&format!("frame_{:06}", index), &detection.annotated)?;
        }

        let processed = index as u64 + 1;

        // Log stats every 30 frames
        if processed % 30 == 0 {
            let avg_ms = total_time.as_secs_f64() * 1000.0 / processed as f64;
            let avg_boxes = total_boxes as f64 / processed as f64;

            tracing::info!(
                "Frame {}: detect={:.1}ms, boxes={:.2}/frame",
                processed,
                avg_ms,
                avg_boxes
            );
        }
    }

    tracing::info!(
        "Done: {} frames, {} detections",
        stream.frames(),
        total_boxes
    );

    Ok(())
}
