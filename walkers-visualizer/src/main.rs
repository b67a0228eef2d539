use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use image::{ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};
use minimp4::Mp4Muxer;
use openh264::encoder::{BitRate, Encoder, EncoderConfig, FrameRate};
use openh264::formats::YUVBuffer;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::time::Instant;
use walkers_common::{Domain, Frame, StreamHeader};

// Track description embedded in the MP4 metadata.
const VIDEO_TITLE: &str = "Biased Gaussian Random Walkers";

// Fixed population colors (RGBA).
const RED: Rgba<u8> = Rgba([220, 40, 40, 255]);
const BLUE: Rgba<u8> = Rgba([40, 60, 220, 255]);
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Command-line arguments for the visualizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input frame stream path (.bin, bincode format)
    #[arg(short, long)]
    input: PathBuf,

    /// Output video file path (.mp4)
    #[arg(short, long, default_value = "walkers_video.mp4")]
    output: PathBuf,

    /// Width of the output video in pixels
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Height of the output video in pixels (calculated from the domain aspect ratio if not provided)
    #[arg(long)]
    height: Option<u32>,

    /// Frames per second (overrides the frame rate recorded in the stream header)
    #[arg(long)]
    fps: Option<u32>,

    /// Video bitrate in kilobits per second (output quality)
    #[arg(long, default_value_t = 5000)]
    bitrate_kbps: u32,

    /// Radius of each walker dot in pixels
    #[arg(long, default_value_t = 5)]
    point_radius: i32,

    /// Number of frames rasterized in parallel per batch
    #[arg(long, default_value_t = 16)]
    chunk_size: usize,
}

/// Maps world coordinates to pixel coordinates. The simulation origin is
/// bottom-left, image origin is top-left, so y flips.
fn world_to_pixel(x: f32, y: f32, domain: &Domain, scale: f32, height_px: u32) -> (i32, i32) {
    let px = ((x - domain.min_x) * scale).round() as i32;
    let py = (height_px as f32 - (y - domain.min_y) * scale).round() as i32;
    (px, py)
}

/// Rasterizes one frame: red dots first, blue dots on top of them.
fn draw_frame(
    frame: &Frame,
    width: u32,
    height: u32,
    domain: &Domain,
    scale: f32,
    point_radius: i32,
) -> RgbaImage {
    let mut image = ImageBuffer::from_pixel(width, height, BACKGROUND);

    for (positions, color) in [(&frame.red, RED), (&frame.blue, BLUE)] {
        for &(x, y) in positions.iter() {
            let (px, py) = world_to_pixel(x, y, domain, scale, height);
            if px >= 0 && px < width as i32 && py >= 0 && py < height as i32 {
                draw_filled_circle_mut(&mut image, (px, py), point_radius, color);
            }
        }
    }

    image
}

/// RGB to YUV 4:2:0 conversion for video encoding (BT.601).
fn rgb_to_yuv420(image: &RgbaImage) -> Vec<u8> {
    let width = image.width() as usize;
    let height = image.height() as usize;

    // Y plane is full size, U and V are quarter size.
    let mut yuv = vec![0u8; width * height + (width * height) / 2];
    let y_plane_size = width * height;

    for y in 0..height {
        for x in 0..width {
            let pixel = image.get_pixel(x as u32, y as u32);
            let r = pixel[0] as f32;
            let g = pixel[1] as f32;
            let b = pixel[2] as f32;
            yuv[y * width + x] = (0.299 * r + 0.587 * g + 0.114 * b).round() as u8;
        }
    }

    // U and V planes, downsampled by 2 in each dimension.
    let u_plane_offset = y_plane_size;
    let v_plane_offset = y_plane_size + y_plane_size / 4;
    let uv_width = width / 2;

    for y in (0..height).step_by(2) {
        for x in (0..width).step_by(2) {
            let mut sum_u = 0f32;
            let mut sum_v = 0f32;
            let mut count = 0;

            for dy in 0..2 {
                for dx in 0..2 {
                    if y + dy < height && x + dx < width {
                        let pixel = image.get_pixel((x + dx) as u32, (y + dy) as u32);
                        let r = pixel[0] as f32;
                        let g = pixel[1] as f32;
                        let b = pixel[2] as f32;
                        sum_u += -0.169 * r - 0.331 * g + 0.5 * b + 128.0;
                        sum_v += 0.5 * r - 0.419 * g - 0.081 * b + 128.0;
                        count += 1;
                    }
                }
            }

            let uv_y = y / 2;
            let uv_x = x / 2;
            yuv[u_plane_offset + uv_y * uv_width + uv_x] = (sum_u / count as f32).round() as u8;
            yuv[v_plane_offset + uv_y * uv_width + uv_x] = (sum_v / count as f32).round() as u8;
        }
    }

    yuv
}

fn main() -> Result<()> {
    let args = Args::parse();
    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    Builder::from_default_env()
        .filter(None, LevelFilter::Info)
        .init();

    info!("Starting Walkers Visualizer...");
    info!("Input file: {}", args.input.display());
    info!("Output video: {}", args.output.display());

    // --- Open the Frame Stream ---
    let input_file = File::open(&args.input)
        .with_context(|| format!("Failed to open input file: {}", args.input.display()))?;
    let mut reader = BufReader::new(input_file);

    let header: StreamHeader = bincode::deserialize_from(&mut reader)
        .context("Failed to read stream header")?;
    let domain = header.domain;
    info!(
        "Stream header: {} ticks, {} red + {} blue walkers, domain [{}, {}] x [{}, {}], {} fps.",
        header.total_ticks,
        header.count_red,
        header.count_blue,
        domain.min_x,
        domain.max_x,
        domain.min_y,
        domain.max_y,
        header.frame_rate
    );

    let fps = args.fps.unwrap_or(header.frame_rate);

    // --- Calculate Output Dimensions and Scale ---
    let aspect_ratio = domain.width() / domain.height();
    // H.264 4:2:0 needs even dimensions.
    let output_width_px = args.width & !1;
    let output_height_px = args
        .height
        .unwrap_or_else(|| (output_width_px as f32 / aspect_ratio) as u32)
        & !1;

    let scale_x = output_width_px as f32 / domain.width();
    let scale_y = output_height_px as f32 / domain.height();
    let scale = scale_x.min(scale_y); // Use smaller scale to ensure everything fits

    info!("Output video dimensions: {}x{} px @ {} fps", output_width_px, output_height_px, fps);
    info!("Scale: {:.4} pixels per world unit", scale);

    // --- Read All Frames ---
    let mut frames: Vec<Frame> = Vec::with_capacity(header.total_ticks as usize);
    for i in 0..header.total_ticks {
        match bincode::deserialize_from::<_, Frame>(&mut reader) {
            Ok(frame) => frames.push(frame),
            Err(e) => {
                warn!(
                    "Failed to read frame {} of {}: {}. Encoding the {} frames read so far.",
                    i + 1,
                    header.total_ticks,
                    e,
                    frames.len()
                );
                break;
            }
        }
    }
    if frames.is_empty() {
        warn!("Input stream contains no frames. Exiting.");
        return Ok(());
    }
    info!("Read {} frames.", frames.len());

    // --- Initialize the Video Encoder ---
    let mut encoder = Encoder::with_api_config(
        openh264::OpenH264API::from_source(),
        EncoderConfig::new()
            .max_frame_rate(FrameRate::from_hz(fps as f32))
            .bitrate(BitRate::from_bps(args.bitrate_kbps * 1000)),
    )
    .context("Failed to initialize H.264 encoder")?;
    let mut h264_data = Vec::new();

    let progress_bar = ProgressBar::new(frames.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) [{eta}]")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    progress_bar.set_message("Encoding frames");

    let start_time = Instant::now();
    let mut frame_count = 0usize;

    // Rasterize in bounded parallel batches, then encode each batch strictly
    // in tick order (the encoder is append-only).
    for chunk in frames.chunks(args.chunk_size.max(1)) {
        let images: Vec<RgbaImage> = chunk
            .par_iter()
            .map(|frame| {
                draw_frame(
                    frame,
                    output_width_px,
                    output_height_px,
                    &domain,
                    scale,
                    args.point_radius,
                )
            })
            .collect();

        for image in &images {
            let yuv_data = rgb_to_yuv420(image);
            let yuv_source =
                YUVBuffer::from_vec(yuv_data, output_width_px as usize, output_height_px as usize);
            let bitstream = encoder
                .encode(&yuv_source)
                .with_context(|| format!("Failed to encode frame {}", frame_count + 1))?;
            bitstream.write_vec(&mut h264_data);
            frame_count += 1;
            progress_bar.inc(1);
        }
    }

    progress_bar.finish_with_message(format!("Encoded {} frames", frame_count));

    // --- Mux the MP4 ---
    info!("Creating MP4 file...");
    let mut video_buffer = Cursor::new(Vec::new());
    let mut mp4muxer = Mp4Muxer::new(&mut video_buffer);
    mp4muxer.init_video(output_width_px as i32, output_height_px as i32, false, VIDEO_TITLE);
    mp4muxer.write_video_with_fps(&h264_data, fps);
    mp4muxer.close();

    video_buffer.seek(SeekFrom::Start(0))?;
    let mut video_bytes = Vec::new();
    video_buffer.read_to_end(&mut video_bytes)?;
    fs::write(&args.output, &video_bytes)
        .with_context(|| format!("Failed to write video file to {}", args.output.display()))?;

    let duration = start_time.elapsed();
    info!(
        "Video generation completed in {:.2?} ({:.1} frames per second)",
        duration,
        frame_count as f64 / duration.as_secs_f64()
    );
    info!("Output saved to: {}", args.output.display());

    Ok(())
}
