use crate::error::AppError;
use crate::models::classify_types::ClassScores;
use crate::services::classifier::model_manager::OnnxSession;
use image::ImageReader;
use ndarray::Array4;
use ort::value::Value;
use std::path::Path;

/// Image processor settings saved next to the model (`preprocessor_config.json`).
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    pub width: u32,
    pub height: u32,
    pub rescale_factor: f32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for PreprocessConfig {
    // ViT image processor defaults
    fn default() -> Self {
        Self {
            width: 224,
            height: 224,
            rescale_factor: 1.0 / 255.0,
            mean: [0.5, 0.5, 0.5],
            std: [0.5, 0.5, 0.5],
        }
    }
}

impl PreprocessConfig {
    /// Read the fields we understand, keeping defaults for anything missing.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut cfg = Self::default();

        match &value["size"] {
            serde_json::Value::Number(n) => {
                if let Some(side) = n.as_u64() {
                    cfg.width = side as u32;
                    cfg.height = side as u32;
                }
            }
            serde_json::Value::Object(size) => {
                if let Some(h) = size.get("height").and_then(|v| v.as_u64()) {
                    cfg.height = h as u32;
                }
                if let Some(w) = size.get("width").and_then(|v| v.as_u64()) {
                    cfg.width = w as u32;
                }
                if let Some(s) = size.get("shortest_edge").and_then(|v| v.as_u64()) {
                    cfg.width = s as u32;
                    cfg.height = s as u32;
                }
            }
            _ => {}
        }

        if let Some(f) = value["rescale_factor"].as_f64() {
            cfg.rescale_factor = f as f32;
        }
        if let Some(mean) = triple(&value["image_mean"]) {
            cfg.mean = mean;
        }
        if let Some(std) = triple(&value["image_std"]) {
            cfg.std = std;
        }
        cfg
    }
}

fn triple(value: &serde_json::Value) -> Option<[f32; 3]> {
    let arr = value.as_array()?;
    if arr.len() != 3 {
        return None;
    }
    let mut out = [0f32; 3];
    for (slot, v) in out.iter_mut().zip(arr) {
        *slot = v.as_f64()? as f32;
    }
    Some(out)
}

/// Decode, force RGB, resize to the model resolution and normalize into NCHW.
pub fn preprocess_image(path: &Path, cfg: &PreprocessConfig) -> Result<Array4<f32>, AppError> {
    let img = ImageReader::open(path)
        .map_err(|e| AppError::inference(format!("Failed to open image {}: {}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| AppError::inference(format!("Failed to read image {}: {}", path.display(), e)))?
        .decode()
        .map_err(|e| AppError::inference(format!("Failed to decode image {}: {}", path.display(), e)))?;

    let rgb = img
        .resize_exact(cfg.width, cfg.height, image::imageops::FilterType::CatmullRom)
        .to_rgb8();

    let tensor = Array4::from_shape_fn(
        (1, 3, cfg.height as usize, cfg.width as usize),
        |(_, c, y, x)| {
            let value = rgb.get_pixel(x as u32, y as u32)[c] as f32 * cfg.rescale_factor;
            (value - cfg.mean[c]) / cfg.std[c]
        },
    );

    Ok(tensor)
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();
    logits
        .iter()
        .map(|&x| (x - max_logit).exp() / exp_sum)
        .collect()
}

/// Pick the fake/real probabilities out of the model's class order.
pub fn order_scores(probabilities: &[f32], class_order: [usize; 2]) -> Result<ClassScores, AppError> {
    if probabilities.len() != 2 {
        return Err(AppError::malformed_output(format!(
            "expected 2 class probabilities, got {}",
            probabilities.len()
        )));
    }
    let [fake_idx, real_idx] = class_order;
    match (probabilities.get(fake_idx), probabilities.get(real_idx)) {
        (Some(&fake), Some(&real)) => Ok(ClassScores::new(fake, real)),
        _ => Err(AppError::malformed_output(format!(
            "label indices {:?} outside model output",
            class_order
        ))),
    }
}

pub fn run_inference_with_model(
    model: &mut OnnxSession,
    input: Array4<f32>,
    class_order: [usize; 2],
) -> Result<ClassScores, AppError> {
    let input_name = model.inputs()[0].name().to_string();

    let input_tensor = Value::from_array(input)
        .map_err(|e| AppError::inference(format!("Failed to create tensor value: {}", e)))?;

    let outputs = model
        .run(ort::inputs![input_name.as_str() => input_tensor])
        .map_err(|e| AppError::inference(format!("Inference failed: {}", e)))?;

    let output_value = outputs
        .values()
        .next()
        .ok_or_else(|| AppError::malformed_output("Model produced no outputs"))?;

    let (_, data) = output_value
        .try_extract_tensor::<f32>()
        .map_err(|e| AppError::malformed_output(format!("Failed to extract output tensor: {}", e)))?;

    let logits: Vec<f32> = data.iter().copied().collect();
    order_scores(&softmax(&logits), class_order)
}
