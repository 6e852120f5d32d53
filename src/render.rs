//! 端末表示用の整形

use detection_history_common::export::{format_class_counts, format_confidences};
use detection_history_common::{DetectionRecord, PreviewPair};

/// 一覧の1行
pub fn summary_line(index: usize, record: &DetectionRecord, preview: Option<&PreviewPair>) -> String {
    format!(
        "{:>2}. [{}] {}  {}  検出{}件  {}",
        index + 1,
        record.id,
        record.date,
        record.filename,
        record.detections.len(),
        if preview.is_some() { "🖼" } else { "プレビューなし" }
    )
}

/// 詳細表示
pub fn detail_lines(record: &DetectionRecord, preview: Option<&PreviewPair>) -> Vec<String> {
    let mut lines = vec![
        format!("ID: {}", record.id),
        format!("ファイル: {}", record.filename),
        format!("日時: {}", record.date),
        format!("クラス別件数: {}", format_class_counts(&record.class_counts)),
        format!("信頼度: {}", format_confidences(&record.confidences)),
        format!("検出数: {}", record.detections.len()),
    ];

    for d in &record.detections {
        let coords = d
            .bbox
            .iter()
            .map(|v| format!("{:.0}", v))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("  {} ({:.1}%) [ {} ]", d.class, d.confidence * 100.0, coords));
    }

    match preview {
        Some(pair) => lines.push(format!(
            "プレビュー: 入力 {} bytes / 出力 {} bytes",
            pair.input.len(),
            pair.output.len()
        )),
        None => lines.push("プレビュー: なし".to_string()),
    }

    lines
}
