//! 検出結果の型定義
//!
//! CLIとWeb(WASM)で共有される型:
//! - BoxDetection: 1つのバウンディングボックス
//! - DetectionResponse: 検出サービスのレスポンス
//! - DetectionRecord: 履歴に保存されるメタデータ（画像は含まない）
//! - PreviewPair: セッション中だけ保持するプレビュー画像

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 1つの検出ボックス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxDetection {
    pub class: String,

    /// 信頼度 (0.0〜1.0)
    #[serde(rename = "conf", alias = "confidence")]
    pub confidence: f64,

    /// [x1, y1, x2, y2]
    #[serde(rename = "box")]
    pub bbox: [f64; 4],
}

/// 検出サービス `/detect` のレスポンス
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetectionResponse {
    pub detections: Vec<BoxDetection>,

    /// 注釈付き画像（base64 PNG）
    pub image: String,

    #[serde(alias = "classCounts")]
    pub class_counts: BTreeMap<String, u32>,

    pub confidences: Vec<f64>,
}

impl DetectionResponse {
    /// JSON文字列からレスポンスをパース
    pub fn parse(json: &str) -> Result<Self> {
        let response: DetectionResponse = serde_json::from_str(json)?;

        if let Some(bad) = response
            .detections
            .iter()
            .find(|d| !(0.0..=1.0).contains(&d.confidence))
        {
            return Err(Error::InvalidResponse(format!(
                "confidence out of range for {}: {}",
                bad.class, bad.confidence
            )));
        }

        Ok(response)
    }

    /// 注釈付き画像のdata URL
    pub fn output_data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.image)
    }
}

/// 検出履歴の1件（永続化されるメタデータのみ）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub id: u64,

    #[serde(default)]
    pub detections: Vec<BoxDetection>,

    #[serde(default, rename = "classCounts", alias = "class_counts")]
    pub class_counts: BTreeMap<String, u32>,

    #[serde(default)]
    pub confidences: Vec<f64>,

    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub filename: String,
}

impl DetectionRecord {
    /// レスポンスから履歴レコードを作成
    pub fn from_response(
        id: u64,
        date: impl Into<String>,
        filename: impl Into<String>,
        response: &DetectionResponse,
    ) -> Self {
        Self {
            id,
            detections: response.detections.clone(),
            class_counts: response.class_counts.clone(),
            confidences: response.confidences.clone(),
            date: date.into(),
            filename: filename.into(),
        }
    }
}

/// 入力画像と出力画像のプレビュー（data URL / object URL）
///
/// 常に両方揃った状態でしか存在しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewPair {
    pub input: String,
    pub output: String,
}

impl PreviewPair {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}
