use std::fs::File;
use std::io::{BufWriter, Write};

use mpegio::av::{PacketKind, StreamSelect};
use mpegio::format::{Mpeg, MpegKind, OpenOptions};
use mpegio::io::FileSource;

fn parse_id(arg: &str) -> Result<u8, Box<dyn std::error::Error>> {
    let id = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16)?,
        None => arg.parse()?,
    };
    Ok(id)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (input, id, output) = match (args.next(), args.next(), args.next()) {
        (Some(i), Some(s), Some(o)) => (i, s, o),
        _ => return Err("usage: extract <file.mpg> <stream-id> <out.es>".into()),
    };
    let id = parse_id(&id)?;

    let src = FileSource::open(&input)?;
    let mut mpeg = Mpeg::open(MpegKind::Any, src, &OpenOptions::default())?;

    println!("Streams in {input}:");
    for n in 0..mpeg.stream_count() {
        if let Some(info) = mpeg.stream_info(n) {
            println!("  {info}");
        }
    }

    println!("\nExtracting stream 0x{id:02X} to {output}...");
    let mut out = BufWriter::new(File::create(&output)?);
    let mut packets = 0u64;
    let mut bytes = 0u64;
    while let Some(pkt) = mpeg.read_packet(StreamSelect::Id(id))? {
        // Flush and still events come back regardless of the selector.
        if pkt.kind != PacketKind::Data {
            continue;
        }
        out.write_all(pkt.data())?;
        packets += 1;
        bytes += pkt.size() as u64;
    }
    out.flush()?;

    println!("Wrote {packets} packets, {bytes} bytes");
    Ok(())
}
