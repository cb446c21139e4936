//! Structure-from-motion stages.

use super::descriptor::{StageDescriptor, StageInputs};
use super::path_arg;
use crate::core::{names, Toolchain};
use std::path::PathBuf;

fn image_listing_args(inputs: &StageInputs<'_>) -> Vec<String> {
    let layout = inputs.layout;
    vec![
        "-i".into(),
        path_arg(&layout.input_dir),
        "-o".into(),
        path_arg(&layout.matches_dir),
        "-d".into(),
        path_arg(&layout.camera_database),
        "-f".into(),
        format_focal_length(inputs.config.parameters().focal_length),
    ]
}

/// Whole focal lengths render without a fractional part (`2304`, not `2304.0`).
fn format_focal_length(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn image_listing_outputs(inputs: &StageInputs<'_>) -> Vec<PathBuf> {
    vec![inputs.layout.matches(names::SFM_DATA_JSON)]
}

fn compute_features_args(inputs: &StageInputs<'_>) -> Vec<String> {
    let layout = inputs.layout;
    vec![
        "-i".into(),
        path_arg(&layout.matches(names::SFM_DATA_JSON)),
        "-o".into(),
        path_arg(&layout.matches_dir),
        "-m".into(),
        inputs.config.parameters().describer_method.clone(),
    ]
}

fn no_outputs(_: &StageInputs<'_>) -> Vec<PathBuf> {
    Vec::new()
}

fn pair_generation_args(inputs: &StageInputs<'_>) -> Vec<String> {
    let layout = inputs.layout;
    vec![
        "-i".into(),
        path_arg(&layout.matches(names::SFM_DATA_JSON)),
        "-o".into(),
        path_arg(&layout.matches(names::PAIRS)),
    ]
}

fn pair_generation_outputs(inputs: &StageInputs<'_>) -> Vec<PathBuf> {
    vec![inputs.layout.matches(names::PAIRS)]
}

fn compute_matches_args(inputs: &StageInputs<'_>) -> Vec<String> {
    let layout = inputs.layout;
    vec![
        "-i".into(),
        path_arg(&layout.matches(names::SFM_DATA_JSON)),
        "-p".into(),
        path_arg(&layout.matches(names::PAIRS)),
        "-o".into(),
        path_arg(&layout.matches(names::PUTATIVE_MATCHES)),
    ]
}

fn compute_matches_outputs(inputs: &StageInputs<'_>) -> Vec<PathBuf> {
    vec![inputs.layout.matches(names::PUTATIVE_MATCHES)]
}

fn geometric_filter_args(inputs: &StageInputs<'_>) -> Vec<String> {
    let layout = inputs.layout;
    vec![
        "-i".into(),
        path_arg(&layout.matches(names::SFM_DATA_JSON)),
        "-m".into(),
        path_arg(&layout.matches(names::PUTATIVE_MATCHES)),
        "-g".into(),
        inputs.config.parameters().geometric_model.clone(),
        "-o".into(),
        path_arg(&layout.matches(names::FILTERED_MATCHES)),
    ]
}

fn geometric_filter_outputs(inputs: &StageInputs<'_>) -> Vec<PathBuf> {
    vec![inputs.layout.matches(names::FILTERED_MATCHES)]
}

fn reconstruction_args(inputs: &StageInputs<'_>) -> Vec<String> {
    let layout = inputs.layout;
    vec![
        "--sfm_engine".into(),
        inputs.config.parameters().sfm_engine.clone(),
        "--input_file".into(),
        path_arg(&layout.matches(names::SFM_DATA_JSON)),
        "--match_dir".into(),
        path_arg(&layout.matches_dir),
        "--output_dir".into(),
        path_arg(&layout.reconstruction_dir),
    ]
}

fn reconstruction_outputs(inputs: &StageInputs<'_>) -> Vec<PathBuf> {
    vec![inputs.layout.reconstruction(names::SFM_DATA_BIN)]
}

fn colorize_args(inputs: &StageInputs<'_>) -> Vec<String> {
    let layout = inputs.layout;
    vec![
        "-i".into(),
        path_arg(&layout.reconstruction(names::SFM_DATA_BIN)),
        "-o".into(),
        path_arg(&layout.reconstruction(names::COLORIZED_PLY)),
    ]
}

fn colorize_outputs(inputs: &StageInputs<'_>) -> Vec<PathBuf> {
    vec![inputs.layout.reconstruction(names::COLORIZED_PLY)]
}

fn export_args(inputs: &StageInputs<'_>) -> Vec<String> {
    let layout = inputs.layout;
    vec![
        "-i".into(),
        path_arg(&layout.reconstruction(names::SFM_DATA_BIN)),
        "-o".into(),
        path_arg(&layout.build(names::SCENE)),
        "-d".into(),
        path_arg(&layout.build_dir),
    ]
}

fn export_outputs(inputs: &StageInputs<'_>) -> Vec<PathBuf> {
    vec![inputs.layout.build(names::SCENE)]
}

/// The eight SfM stages in execution order.
#[must_use]
pub fn sfm_stages() -> Vec<StageDescriptor> {
    vec![
        StageDescriptor::new(
            "image_listing",
            "openMVG_main_SfMInit_ImageListing",
            Toolchain::Sfm,
            image_listing_args,
            image_listing_outputs,
        ),
        StageDescriptor::new(
            "compute_features",
            "openMVG_main_ComputeFeatures",
            Toolchain::Sfm,
            compute_features_args,
            no_outputs,
        ),
        StageDescriptor::new(
            "pair_generation",
            "openMVG_main_PairGenerator",
            Toolchain::Sfm,
            pair_generation_args,
            pair_generation_outputs,
        ),
        StageDescriptor::new(
            "compute_matches",
            "openMVG_main_ComputeMatches",
            Toolchain::Sfm,
            compute_matches_args,
            compute_matches_outputs,
        ),
        StageDescriptor::new(
            "geometric_filter",
            "openMVG_main_GeometricFilter",
            Toolchain::Sfm,
            geometric_filter_args,
            geometric_filter_outputs,
        ),
        StageDescriptor::new(
            "incremental_reconstruction",
            "openMVG_main_SfM",
            Toolchain::Sfm,
            reconstruction_args,
            reconstruction_outputs,
        ),
        StageDescriptor::new(
            "colorize",
            "openMVG_main_ComputeSfM_DataColor",
            Toolchain::Sfm,
            colorize_args,
            colorize_outputs,
        ),
        StageDescriptor::new(
            "export_to_mvs",
            "openMVG_main_openMVG2openMVS",
            Toolchain::Sfm,
            export_args,
            export_outputs,
        ),
    ]
}
