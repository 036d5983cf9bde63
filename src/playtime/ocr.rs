use anyhow::{Context, Result};
use image::GrayImage;
use image::imageops::{self, FilterType};
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;

use super::MinutesReader;
use crate::config::OcrConfig;

static DIGIT_GROUPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit pattern must compile"));

/// Sum of every run of digits in `text`; 0 when there are none.
///
/// Runs too large for a u64 are skipped as misreads.
pub fn sum_digit_groups(text: &str) -> u64 {
    DIGIT_GROUPS
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u64>().ok())
        .fold(0, u64::saturating_add)
}

/// Grayscale, crop to the minutes label and upscale for OCR.
///
/// `crop_box` is `[left, top, right, bottom]` and is clamped to the image.
pub fn preprocess_graph(image: &[u8], crop_box: [u32; 4], scale_factor: u32) -> Result<GrayImage> {
    let gray = image::load_from_memory(image)
        .context("Failed to decode graph image")?
        .to_luma8();

    let [left, top, right, bottom] = crop_box;
    let (width, height) = gray.dimensions();
    let x = left.min(width);
    let y = top.min(height);
    let crop_width = right.min(width).saturating_sub(x);
    let crop_height = bottom.min(height).saturating_sub(y);

    if crop_width == 0 || crop_height == 0 {
        anyhow::bail!(
            "Crop box {crop_box:?} lies outside the {width}x{height} graph image"
        );
    }

    let cropped = imageops::crop_imm(&gray, x, y, crop_width, crop_height).to_image();
    let scale = scale_factor.max(1);

    Ok(imageops::resize(
        &cropped,
        crop_width * scale,
        crop_height * scale,
        FilterType::Lanczos3,
    ))
}

/// OCR through an external program (tesseract by default).
///
/// The preprocessed image is written to `{work_dir}/inprogress.png` and the
/// program's stdout is scanned for digits.
pub struct CommandOcr {
    command: String,
    args: Vec<String>,
    crop_box: [u32; 4],
    scale_factor: u32,
    work_dir: PathBuf,
}

impl CommandOcr {
    pub fn from_config(config: &OcrConfig, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            crop_box: config.crop_box,
            scale_factor: config.scale_factor,
            work_dir: work_dir.into(),
        }
    }
}

impl MinutesReader for CommandOcr {
    fn read_minutes(&self, image: &[u8]) -> Result<u64> {
        let prepared = preprocess_graph(image, self.crop_box, self.scale_factor)?;

        fs::create_dir_all(&self.work_dir)
            .with_context(|| format!("Failed to create {}", self.work_dir.display()))?;
        let path = self.work_dir.join("inprogress.png");
        prepared
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        let image_arg = path.to_string_lossy();
        let output = Command::new(&self.command)
            .args(self.args.iter().map(|arg| arg.replace("{image}", &image_arg)))
            .output()
            .with_context(|| format!("Failed to run OCR command `{}`", self.command))?;

        if !output.status.success() {
            anyhow::bail!(
                "OCR command `{}` exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(sum_digit_groups(&String::from_utf8_lossy(&output.stdout)))
    }
}
