//! Very simple functions for producing KML files of a batch, so the clusters and hotspots can be
//! looked at in Google Earth or similar.
//!
//! Only the parts of KML needed here are implemented, with a streaming type API. That means the
//! user is responsible for closing all tags.

use crate::{
    cluster::{ClusterSeverity, FireCluster},
    error::BurnWatchResult,
    hotspot::FireHotspot,
    snapshot::BatchSnapshot,
};
use chrono::{DateTime, Utc};
use std::{
    fmt::Write as _,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

const FOOTER: &str = concat!(r#"</Document>"#, "\n", r#"</kml>"#, "\n");

pub struct KmlFile {
    out: BufWriter<File>,
    finished: bool,
}

impl KmlFile {
    pub fn new<P: AsRef<Path>>(pth: P) -> BurnWatchResult<Self> {
        let p = pth.as_ref();

        let f = std::fs::File::create(p)?;
        let mut new = KmlFile {
            out: BufWriter::new(f),
            finished: false,
        };
        new.start_document()?;
        Ok(new)
    }

    /// Close the document and flush it to disk, reporting any error.
    ///
    /// If a KmlFile is dropped without calling this, the document is still closed but errors are
    /// lost.
    pub fn finish(mut self) -> io::Result<()> {
        self.finished = true;
        self.out.write_all(FOOTER.as_bytes())?;
        self.out.flush()
    }
}

impl KmlWriter for KmlFile {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.out
    }
}

impl Drop for KmlFile {
    fn drop(&mut self) {
        if !self.finished {
            self.finish_document();
        }
    }
}

pub trait KmlWriter {
    fn output(&mut self) -> &mut dyn Write;

    /// Put the header out.
    fn start_document(&mut self) -> io::Result<()> {
        const HEADER: &str = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#,
            "\n",
            "<Document>\n"
        );

        self.output().write_all(HEADER.as_bytes())
    }

    /// Close a document.
    fn finish_document(&mut self) {
        let _ = self.output().write_all(FOOTER.as_bytes());
    }

    /// Write a description element to the file.
    fn write_description(&mut self, description: &str) -> io::Result<()> {
        writeln!(
            self.output(),
            "<description><![CDATA[{}]]></description>",
            description
        )
    }

    /// Start a KML folder.
    fn start_folder(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        is_open: bool,
    ) -> io::Result<()> {
        self.output().write_all("<Folder>\n".as_bytes())?;

        if let Some(name) = name {
            writeln!(self.output(), "<name>{}</name>", name)?;
        }

        if let Some(description) = description {
            self.write_description(description)?;
        }

        if is_open {
            self.output().write_all("<open>1</open>\n".as_bytes())?;
        }

        Ok(())
    }

    /// Close out a folder element
    fn finish_folder(&mut self) -> io::Result<()> {
        writeln!(self.output(), "</Folder>")
    }

    /// Start a placemark element.
    fn start_placemark(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        style_url: Option<&str>,
    ) -> io::Result<()> {
        writeln!(self.output(), "<Placemark>")?;

        if let Some(name) = name {
            writeln!(self.output(), "<name>{}</name>", name)?;
        }

        if let Some(description) = description {
            self.write_description(description)?;
        }

        if let Some(style_url) = style_url {
            writeln!(self.output(), "<styleUrl>{}</styleUrl>", style_url)?;
        }

        Ok(())
    }

    /// Close out a placemark element.
    fn finish_placemark(&mut self) -> io::Result<()> {
        writeln!(self.output(), "</Placemark>")
    }

    /// Start a style definition.
    fn start_style(&mut self, style_id: Option<&str>) -> io::Result<()> {
        if let Some(style_id) = style_id {
            writeln!(self.output(), "<Style id=\"{}\">", style_id)
        } else {
            writeln!(self.output(), "<Style>")
        }
    }

    /// Close out a style definition.
    fn finish_style(&mut self) -> io::Result<()> {
        writeln!(self.output(), "</Style>")
    }

    /// Create an IconStyle element.
    ///
    /// The color is in the KML aabbggrr format.
    fn create_icon_style(
        &mut self,
        icon_url: Option<&str>,
        color: Option<&str>,
        scale: f64,
    ) -> io::Result<()> {
        writeln!(self.output(), "<IconStyle>")?;

        if let Some(color) = color {
            writeln!(self.output(), "<color>{}</color>", color)?;
        }

        if scale > 0.0 {
            writeln!(self.output(), "<scale>{}</scale>", scale)?;
        } else {
            writeln!(self.output(), "<scale>1</scale>")?;
        }

        if let Some(icon_url) = icon_url {
            writeln!(self.output(), "<Icon><href>{}</href></Icon>", icon_url)?;
        }

        writeln!(self.output(), "</IconStyle>")
    }

    /// Write out a TimeStamp element.
    fn timestamp(&mut self, when: DateTime<Utc>) -> io::Result<()> {
        writeln!(
            self.output(),
            "<TimeStamp><when>{}</when></TimeStamp>",
            when.format("%Y-%m-%dT%H:%M:%S.000Z")
        )
    }

    /// Write out a KML Point element
    fn create_point(&mut self, lat: f64, lon: f64, z: f64) -> io::Result<()> {
        writeln!(
            self.output(),
            "<Point>\n<coordinates>{},{},{}</coordinates>\n</Point>",
            lon,
            lat,
            z
        )
    }
}

const FIRE_ICON: &str = "http://maps.google.com/mapfiles/kml/shapes/firedept.png";

fn cluster_style(severity: ClusterSeverity) -> &'static str {
    match severity {
        ClusterSeverity::Critical => "#cluster_critical",
        ClusterSeverity::High => "#cluster_high",
        ClusterSeverity::Moderate => "#cluster_moderate",
        ClusterSeverity::Low => "#cluster_low",
    }
}

fn write_styles<K: KmlWriter + ?Sized>(kml: &mut K) -> io::Result<()> {
    kml.start_style(Some("hotspot"))?;
    kml.create_icon_style(Some(FIRE_ICON), None, 0.4)?;
    kml.finish_style()?;

    for (id, color, scale) in [
        ("cluster_critical", "ff0000ff", 1.6),
        ("cluster_high", "ff0080ff", 1.3),
        ("cluster_moderate", "ff00ffff", 1.0),
        ("cluster_low", "ff00ff00", 0.8),
    ] {
        kml.start_style(Some(id))?;
        kml.create_icon_style(Some(FIRE_ICON), Some(color), scale)?;
        kml.finish_style()?;
    }

    Ok(())
}

fn cluster_description(cluster: &FireCluster) -> String {
    format!(
        concat!(
            "Severity: {}<br/>",
            "Fires: {}<br/>",
            "Total Power: {:.1} MW<br/>",
            "Avg Confidence: {:.0}%<br/>",
            "Extent: {:.1} km<br/>",
        ),
        cluster.severity,
        cluster.fire_count,
        cluster.total_frp,
        cluster.avg_confidence,
        cluster.extent_km,
    )
}

fn hotspot_description(hotspot: &FireHotspot) -> String {
    let mut description = format!(
        concat!("Power: {:.1} MW<br/>", "Confidence: {}%<br/>", "Source: {}<br/>"),
        hotspot.frp, hotspot.confidence, hotspot.source_tier,
    );

    if let Some(brightness) = hotspot.brightness {
        let _ = write!(&mut description, "Brightness: {:.1}K<br/>", brightness);
    }

    if let Some(impact) = hotspot.impact_score {
        let _ = write!(&mut description, "Impact: {:.3}<br/>", impact);
    }

    description
}

/**
 * Write the clusters and hotspots of a batch.
 *
 * The document must already be started, and it is left open.
 */
pub fn write_snapshot<K: KmlWriter + ?Sized>(
    kml: &mut K,
    snapshot: &BatchSnapshot,
) -> io::Result<()> {
    write_styles(kml)?;

    let batch_description = format!(
        "Source: {} ({})<br/>Stubble Burning: {:.1}% ({})<br/>",
        snapshot.metadata.source,
        snapshot.metadata.status,
        snapshot.attribution.stubble_percentage,
        snapshot.attribution.severity,
    );

    kml.start_folder(Some("Clusters"), Some(&batch_description), true)?;
    for (rank, cluster) in snapshot.clusters.iter().enumerate() {
        let name = format!("Cluster {} ({})", rank + 1, cluster.severity);

        kml.start_placemark(
            Some(&name),
            Some(&cluster_description(cluster)),
            Some(cluster_style(cluster.severity)),
        )?;
        kml.timestamp(snapshot.metadata.timestamp)?;
        kml.create_point(cluster.center.lat, cluster.center.lon, 0.0)?;
        kml.finish_placemark()?;
    }
    kml.finish_folder()?;

    kml.start_folder(Some("Hotspots"), None, false)?;
    for hotspot in &snapshot.all_fires {
        let name = hotspot.id.to_string();

        kml.start_placemark(
            Some(&name),
            Some(&hotspot_description(hotspot)),
            Some("#hotspot"),
        )?;
        kml.create_point(hotspot.position.lat, hotspot.position.lon, 0.0)?;
        kml.finish_placemark()?;
    }
    kml.finish_folder()?;

    Ok(())
}

impl BatchSnapshot {
    /// Export the batch as a KML file.
    pub fn save_kml<P: AsRef<Path>>(&self, path: P) -> BurnWatchResult<()> {
        let mut kfile = KmlFile::new(path)?;
        write_snapshot(&mut kfile, self)?;
        kfile.finish()?;
        Ok(())
    }
}
