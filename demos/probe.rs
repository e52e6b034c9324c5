use mpegio::format::{Mpeg, MpegKind, OpenOptions};
use mpegio::io::FileSource;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: probe <file.mpg>")?;

    println!("Probing {path}...");
    let src = FileSource::open(&path)?;
    let mpeg = Mpeg::open(MpegKind::Any, src, &OpenOptions::default())?;

    let layout = match mpeg.kind() {
        MpegKind::Ps => "program stream",
        _ => "elementary stream",
    };
    println!("Layout: {layout}");
    if let Some(ticks) = mpeg.duration() {
        // Durations are kept on the 27 MHz system clock.
        println!("Duration: {:.1} s", ticks as f64 / 27_000_000.0);
    }

    println!("\nFound {} stream(s):", mpeg.stream_count());
    for n in 0..mpeg.stream_count() {
        if let Some(info) = mpeg.stream_info(n) {
            println!("  {info}");
            if info.start_time > 0 {
                println!("    first pts: {} ms", info.start_time / 90);
            }
        }
    }

    Ok(())
}
