use clap::Parser;
use log::Level;

use ines_tool::cartridge::{RomHeader, RomImage};
use ines_tool::{chr, logger};

#[derive(Parser, Debug)]
#[clap(about, version)]
struct Args {
  #[clap(short, long)]
  file: String,

  #[clap(short, long)]
  export_chr: bool,

  #[clap(short, long, default_value = ".")]
  out_dir: String,

  #[clap(long)]
  json: bool,

  #[clap(short, long)]
  verbose: bool,
}

fn report_header(header: &RomHeader) {
  println!("PRG ROM {} x 16 KB units", header.prg_rom_banks);
  println!("CHR ROM {} x 8 KB units", header.chr_rom_banks);
  println!("mirroring: {}", header.mirroring);
  println!(
    "has battery backed prg ram: {}",
    header.has_battery_backed_ram
  );
  println!("has trainer: {}", header.has_trainer);
  println!(
    "ignore mirroring control: {}",
    header.ignore_mirroring_control
  );
  println!("mapper number: {}", header.mapper_number);
}

fn main() -> anyhow::Result<()> {
  let args = Args::parse();
  let level = if args.verbose {
    Level::Debug
  } else {
    Level::Info
  };
  match logger::init(level) {
    Err(_) => return Ok(()),
    Ok(_) => {}
  };

  let rom = RomImage::load_from_file(&args.file)?;
  if args.json {
    println!("{}", serde_json::to_string_pretty(rom.header())?);
  } else {
    report_header(rom.header());
  }

  if args.export_chr {
    chr::export_chr_banks(&rom, &args.out_dir)?;
  }
  Ok(())
}
