use terrain_tiles::storage::{resample, NoDataRule, Payload, SourceFormat};

use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<_> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: inspect_tile <tile file> <ddm16|bil16|mapbox_rgb|generic_rgb> [grid size]");
        std::process::exit(2);
    }
    let tile_path = &args[1];
    let format = parse_format(&args[2])?;
    let grid_size: usize = match args.get(3) {
        Some(size) => size.parse()?,
        None => 32,
    };

    println!("Loading {}", tile_path);

    let payload = Payload::from(std::fs::read(tile_path)?);
    let raster = format.decode(&payload, 1.0)?;
    let no_data = format.no_data_rule(format.default_no_data_values(), 1.0);

    println!("Decoded {0}x{0} samples as {1:?}\n", raster.side(), format);
    describe_heights("raster", raster.heights(), &no_data);

    let resampled = resample(&raster, grid_size, &no_data, None, true);
    println!("Resampled onto a {} cell grid: {:?}\n", grid_size, resampled.shape);
    describe_heights("current", resampled.current.heights(), &no_data);
    if let Some(children) = &resampled.children {
        for (name, child) in ["north-west", "north-east", "south-west", "south-east"].iter().zip(children.iter()) {
            describe_heights(name, child.heights(), &no_data);
        }
    }

    Ok(())
}

fn parse_format(name: &str) -> Result<SourceFormat, String> {
    match name {
        "ddm16" => Ok(SourceFormat::Ddm16),
        "bil16" => Ok(SourceFormat::Bil16),
        "mapbox_rgb" => Ok(SourceFormat::MapboxRgb),
        "generic_rgb" => Ok(SourceFormat::GenericRgb),
        other => Err(format!("unknown tile format {:?}", other)),
    }
}

fn describe_heights(name: &str, heights: &[f32], no_data: &NoDataRule) {
    let valid: Vec<f32> = heights.iter().copied().filter(|&h| !no_data.is_no_data(h)).collect();
    let min = valid.iter().copied().fold(f32::INFINITY, f32::min);
    let max = valid.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    println!(
        "{}: {} heights, {} no data; min = {:.1} m, max = {:.1} m\n",
        name,
        heights.len(),
        heights.len() - valid.len(),
        min,
        max
    );
}
