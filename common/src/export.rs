//! 検出結果の書き出し・表示用フォーマット

use crate::error::Result;
use crate::types::BoxDetection;
use std::collections::BTreeMap;

/// 検出ボックスを整形済みJSONで出力
pub fn to_json(detections: &[BoxDetection]) -> Result<String> {
    Ok(serde_json::to_string_pretty(detections)?)
}

/// 検出ボックスをCSVで出力
///
/// `class,confidence,box` ヘッダーの後に `class,conf,[x1 y1 x2 y2]` を1行ずつ。
pub fn to_csv(detections: &[BoxDetection]) -> String {
    let mut lines = Vec::with_capacity(detections.len() + 1);
    lines.push("class,confidence,box".to_string());

    for d in detections {
        let coords = d
            .bbox
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("{},{},[{}]", d.class, d.confidence, coords));
    }

    lines.join("\n")
}

/// `"FireExtinguisher: 1, ToolBox: 2"`
pub fn format_class_counts(counts: &BTreeMap<String, u32>) -> String {
    counts
        .iter()
        .map(|(class, count)| format!("{}: {}", class, count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `"93.1%, 88.0%"`
pub fn format_confidences(confidences: &[f64]) -> String {
    confidences
        .iter()
        .map(|c| format!("{:.1}%", c * 100.0))
        .collect::<Vec<_>>()
        .join(", ")
}
