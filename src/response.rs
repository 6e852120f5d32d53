//! 検出サービスのレスポンスを履歴用に整形する
//!
//! レスポンスが読めない場合はエラーを返すだけで、履歴には一切触らない。

use crate::error::{DetectionHistoryError, Result};
use base64::Engine;
use detection_history_common::{DetectionHistory, DetectionRecord, DetectionResponse};
use std::fmt::Write;
use std::path::Path;

/// 履歴に追加する1件分
#[derive(Debug, Clone)]
pub struct ImportedDetection {
    pub record: DetectionRecord,
    pub input_preview: String,
    pub output_preview: String,
}

/// 保存済みのレスポンスJSONを読み込む
pub fn load_response(path: &Path) -> Result<DetectionResponse> {
    if !path.exists() {
        return Err(DetectionHistoryError::FileNotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    DetectionResponse::parse(&content)
        .map_err(|e| DetectionHistoryError::ResponseParse(format!("{}: {}", path.display(), e)))
}

/// 入力画像をdata URLにする
pub fn input_data_url(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(DetectionHistoryError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let mime = image::guess_format(&bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");

    Ok(format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    ))
}

/// `date_format` で日時を文字列にする（不正な指定子はエラー）
pub fn format_date<Tz>(now: chrono::DateTime<Tz>, date_format: &str) -> Result<String>
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut date = String::new();
    write!(date, "{}", now.format(date_format))
        .map_err(|_| DetectionHistoryError::Config(format!("日時フォーマットが不正です: {}", date_format)))?;
    Ok(date)
}

/// レスポンスと入力画像から追加データを作る
pub fn import_detection(
    history: &DetectionHistory,
    response_path: &Path,
    image_path: &Path,
    date_format: &str,
) -> Result<ImportedDetection> {
    let response = load_response(response_path)?;
    let input_preview = input_data_url(image_path)?;

    let filename = image_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let date = format_date(chrono::Local::now(), date_format)?;

    let record = DetectionRecord::from_response(history.next_id(), date, filename, &response);

    Ok(ImportedDetection {
        record,
        input_preview,
        output_preview: response.output_data_url(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_input_data_url_png() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("input.png");
        // PNGシグネチャ
        std::fs::write(&path, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0]).unwrap();

        let url = input_data_url(&path).expect("data URL生成失敗");
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_input_data_url_unknown_format() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("notes.bin");
        std::fs::write(&path, b"hello").unwrap();

        let url = input_data_url(&path).unwrap();
        assert_eq!(url, "data:application/octet-stream;base64,aGVsbG8=");
    }

    #[test]
    fn test_format_date() {
        let at = chrono::Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 0).unwrap();
        assert_eq!(format_date(at, "%Y/%m/%d %H:%M").unwrap(), "2026/10/18 09:05");

        let err = format_date(at, "%Y-%Q").unwrap_err();
        assert!(matches!(err, DetectionHistoryError::Config(_)));
    }

    #[test]
    fn test_load_response_missing_file() {
        let err = load_response(Path::new("/nonexistent/response.json")).unwrap_err();
        assert!(matches!(err, DetectionHistoryError::FileNotFound(_)));
    }

    #[test]
    fn test_load_response_broken_json() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("response.json");
        std::fs::write(&path, "<html>502 Bad Gateway</html>").unwrap();

        let err = load_response(&path).unwrap_err();
        assert!(matches!(err, DetectionHistoryError::ResponseParse(_)));
    }
}
