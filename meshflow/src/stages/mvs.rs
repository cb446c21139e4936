//! Multi-view stereo stages.

use super::descriptor::{StageDescriptor, StageInputs};
use super::path_arg;
use crate::core::{names, Toolchain};
use std::path::PathBuf;

fn densify_args(inputs: &StageInputs<'_>) -> Vec<String> {
    let layout = inputs.layout;
    vec![
        path_arg(&layout.build(names::SCENE)),
        "-o".into(),
        path_arg(&layout.build(names::DENSE_SCENE)),
        "-w".into(),
        path_arg(&layout.build_dir),
        "--max-threads".into(),
        inputs.config.max_threads().to_string(),
    ]
}

fn densify_outputs(inputs: &StageInputs<'_>) -> Vec<PathBuf> {
    vec![inputs.layout.build(names::DENSE_SCENE)]
}

fn reconstruct_mesh_args(inputs: &StageInputs<'_>) -> Vec<String> {
    let layout = inputs.layout;
    vec![
        path_arg(&layout.build(names::DENSE_SCENE)),
        "-o".into(),
        path_arg(&layout.build(names::MESH)),
        "-w".into(),
        path_arg(&layout.build_dir),
    ]
}

fn reconstruct_mesh_outputs(inputs: &StageInputs<'_>) -> Vec<PathBuf> {
    vec![inputs.layout.build(names::MESH)]
}

// Refinement reads the sparse scene with the raw mesh, not the dense scene.
fn refine_mesh_args(inputs: &StageInputs<'_>) -> Vec<String> {
    let layout = inputs.layout;
    let params = inputs.config.parameters();
    vec![
        path_arg(&layout.build(names::SCENE)),
        "-m".into(),
        path_arg(&layout.build(names::MESH)),
        "-o".into(),
        path_arg(&layout.build(names::REFINED_SCENE)),
        "-w".into(),
        path_arg(&layout.build_dir),
        "--scales".into(),
        params.refine_scales.to_string(),
        "--max-face-area".into(),
        params.max_face_area.to_string(),
        "--max-threads".into(),
        inputs.config.max_threads().to_string(),
    ]
}

fn refine_mesh_outputs(inputs: &StageInputs<'_>) -> Vec<PathBuf> {
    vec![
        inputs.layout.build(names::REFINED_SCENE),
        inputs.layout.build(names::REFINED_MESH),
    ]
}

fn texture_mesh_args(inputs: &StageInputs<'_>) -> Vec<String> {
    let layout = inputs.layout;
    vec![
        path_arg(&layout.build(names::DENSE_SCENE)),
        "-m".into(),
        path_arg(&layout.build(names::REFINED_MESH)),
        "-o".into(),
        path_arg(&layout.build(names::TEXTURED_SCENE)),
        "-w".into(),
        path_arg(&layout.build_dir),
        "--export-type".into(),
        inputs.config.parameters().texture_export_type.to_string(),
    ]
}

fn texture_mesh_outputs(inputs: &StageInputs<'_>) -> Vec<PathBuf> {
    inputs
        .config
        .parameters()
        .texture_export_type
        .files(names::TEXTURED_MESH_STEM)
        .iter()
        .map(|name| inputs.layout.build(name))
        .collect()
}

/// The four MVS stages in execution order.
#[must_use]
pub fn mvs_stages() -> Vec<StageDescriptor> {
    vec![
        StageDescriptor::new(
            "densify_point_cloud",
            "DensifyPointCloud",
            Toolchain::Mvs,
            densify_args,
            densify_outputs,
        ),
        StageDescriptor::new(
            "reconstruct_mesh",
            "ReconstructMesh",
            Toolchain::Mvs,
            reconstruct_mesh_args,
            reconstruct_mesh_outputs,
        ),
        StageDescriptor::new(
            "refine_mesh",
            "RefineMesh",
            Toolchain::Mvs,
            refine_mesh_args,
            refine_mesh_outputs,
        ),
        StageDescriptor::new(
            "texture_mesh",
            "TextureMesh",
            Toolchain::Mvs,
            texture_mesh_args,
            texture_mesh_outputs,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineConfig, ToolParameters};
    use crate::core::MeshFormat;
    use crate::stages::descriptor::fixtures;
    use pretty_assertions::assert_eq;

    fn stage(name: &str) -> StageDescriptor {
        mvs_stages().into_iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn test_densify_passes_thread_count() {
        let config = fixtures::config();
        let layout = fixtures::layout();
        let args = stage("densify_point_cloud").args(&StageInputs::new(&config, &layout));
        assert_eq!(
            args,
            vec![
                "/data/out/build/scene.mvs",
                "-o",
                "/data/out/build/scene_dense.mvs",
                "-w",
                "/data/out/build",
                "--max-threads",
                "4",
            ]
        );
    }

    #[test]
    fn test_refine_reads_sparse_scene() {
        let config = fixtures::config();
        let layout = fixtures::layout();
        let args = stage("refine_mesh").args(&StageInputs::new(&config, &layout));
        assert_eq!(args[0], "/data/out/build/scene.mvs");
        assert_eq!(
            &args[7..],
            &["--scales", "1", "--max-face-area", "16", "--max-threads", "4"]
        );
    }

    #[test]
    fn test_texture_exports_obj() {
        let config = fixtures::config();
        let layout = fixtures::layout();
        let texture = stage("texture_mesh");
        let inputs = StageInputs::new(&config, &layout);
        let args = texture.args(&inputs);
        assert_eq!(args[0], "/data/out/build/scene_dense.mvs");
        assert_eq!(args[2], "/data/out/build/scene_dense_mesh_refine.ply");
        assert_eq!(args[args.len() - 2..], ["--export-type", "obj"]);
        assert_eq!(
            texture.expected_artifacts(&inputs),
            vec![
                PathBuf::from("/data/out/build/scene_dense_mesh_refine_texture.obj"),
                PathBuf::from("/data/out/build/scene_dense_mesh_refine_texture.mtl"),
            ]
        );
    }

    #[test]
    fn test_texture_export_type_is_configurable() {
        let config = PipelineConfig::builder()
            .input_dir("/data/photos")
            .output_dir("/data/out")
            .parameters(ToolParameters::new().with_texture_export_type(MeshFormat::Glb))
            .build()
            .unwrap();
        let layout = fixtures::layout();
        let inputs = StageInputs::new(&config, &layout);
        let texture = stage("texture_mesh");

        let args = texture.args(&inputs);
        assert_eq!(args[args.len() - 2..], ["--export-type", "glb"]);
        assert_eq!(
            texture.expected_artifacts(&inputs),
            vec![PathBuf::from("/data/out/build/scene_dense_mesh_refine_texture.glb")]
        );
    }

    #[test]
    fn test_all_stages_use_mvs_toolchain() {
        assert!(mvs_stages().iter().all(|s| s.toolchain == Toolchain::Mvs));
        assert_eq!(mvs_stages().len(), 4);
    }
}
