//! Tools for inspecting junction markings outside of any editor: list the derived points, check
//! that a saved document still applies to a junction, and export everything as GeoJSON.

#[macro_use]
extern crate log;

mod export;

use anyhow::{bail, Result};
use structopt::StructOpt;

use marking_model::host::JunctionInput;
use marking_model::{Markup, MarkupConfig, MarkupDocument};

#[derive(StructOpt)]
#[structopt(name = "markcli", about = "Junction marking tools")]
enum Command {
    /// Print every marking point of a junction, with its position and direction
    Points {
        #[structopt(flatten)]
        input: Input,
    },
    /// Load a saved marking document onto a junction and report anything that no longer applies
    Check {
        #[structopt(flatten)]
        input: Input,
        /// The marking document to check
        #[structopt(long)]
        markup: String,
        /// Save what still applies to this path, in the current document format
        #[structopt(long)]
        rewrite: Option<String>,
    },
    /// Write points, rule spans, lane corridors and filler outlines as a GeoJSON FeatureCollection
    #[structopt(name = "export-geojson")]
    ExportGeoJSON {
        #[structopt(flatten)]
        input: Input,
        /// A marking document to apply first. Without one, only the points are exported.
        #[structopt(long)]
        markup: Option<String>,
        /// The GeoJSON file to write
        #[structopt(long)]
        output: String,
    },
}

#[derive(StructOpt)]
struct Input {
    /// The path to a JSON junction snapshot
    #[structopt(long)]
    junction: String,
    /// The path to a JSON MarkupConfig. Missing fields use the defaults.
    #[structopt(long)]
    config: Option<String>,
}

impl Input {
    fn load(&self) -> Result<Markup> {
        let junction = JunctionInput::load(&self.junction)?;
        let config = match self.config {
            Some(ref path) => MarkupConfig::load(path)?,
            None => MarkupConfig::default(),
        };
        info!(
            "Loaded {} with {} connections",
            self.junction,
            junction.connections.len()
        );
        Ok(Markup::new(&junction, config))
    }
}

fn main() -> Result<()> {
    abstutil::logger::setup();

    match Command::from_args() {
        Command::Points { input } => points(&input.load()?),
        Command::Check {
            input,
            markup,
            rewrite,
        } => check(input.load()?, markup, rewrite)?,
        Command::ExportGeoJSON {
            input,
            markup,
            output,
        } => {
            let mut model = input.load()?;
            if let Some(path) = markup {
                model.load_document(&MarkupDocument::load(&path)?, None)?;
            }
            export::write_geojson_file(&model, &output)?;
            println!("Wrote {}", output);
        }
    }
    Ok(())
}

fn points(markup: &Markup) {
    for entrance in markup.entrances() {
        println!(
            "{} ({} lanes, half width {})",
            entrance.id,
            entrance.lanes().len(),
            entrance.frame.half_width
        );
        for pt in entrance.all_points() {
            match markup.point_geometry(pt.id) {
                Some(g) => println!("  {} at {}, facing {}", pt.id, g.position, g.direction),
                None => println!("  {} has no position", pt.id),
            }
        }
    }
}

fn check(mut markup: Markup, path: String, rewrite: Option<String>) -> Result<()> {
    let doc = MarkupDocument::load(&path)?;
    let report = markup.load_document(&doc, None)?;
    println!(
        "{}: {} offsets, {} lines, {} rules, {} fillers",
        path, report.points, report.lines, report.rules, report.fillers
    );
    if let Some(out) = rewrite {
        markup.to_document().save(&out)?;
        println!("Wrote {}", out);
    }
    let unoutlined = markup
        .fillers()
        .filter(|f| markup.filler_outline(f.id).is_none())
        .count();
    if report.dropped > 0 || unoutlined > 0 {
        bail!(
            "{} records don't apply to this junction, and {} fillers can't be outlined",
            report.dropped,
            unoutlined
        );
    }
    Ok(())
}
