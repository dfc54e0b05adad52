//! Beräkning av capaian (måluppfyllelse) och penjelasan (klassificering)
//!
//! Negativ vikt betyder en "negativ indikator": vikten anger ett tak för antal
//! oönskade händelser och skoren anger observerat antal.

use crate::models::{AspectSummary, Classification, PenilaianRow};

/// Avrundning halva uppåt, samma beteende som den ursprungliga webbklienten
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Capaian i procent för ett (vikt, skor)-par
pub fn achievement(weight: f64, score: f64) -> i64 {
    if weight == 0.0 {
        return 100;
    }

    if weight < 0.0 {
        if score == 0.0 {
            return 0;
        }
        let abs_weight = weight.abs();
        let ratio = (score.abs().min(abs_weight) / abs_weight).clamp(0.0, 1.0);
        return -round_half_up(ratio * 100.0);
    }

    round_half_up(score / weight * 100.0)
}

/// Klassificering för ett (vikt, skor)-par
pub fn classify(weight: f64, score: f64) -> Classification {
    if weight < 0.0 {
        // Binär: varje oönskad händelse ger Poor
        return if score == 0.0 {
            Classification::VeryGood
        } else {
            Classification::Poor
        };
    }

    Classification::from_achievement(achievement(weight, score))
}

/// Summera (vikt, skor) för en grupp rader.
///
/// Rader med negativ vikt bidrar med sin skor i stället för sin vikt till totalvikten.
pub fn aggregate<'a, I>(rows: I) -> (f64, f64)
where
    I: IntoIterator<Item = &'a PenilaianRow>,
{
    rows.into_iter().fold((0.0, 0.0), |(total_weight, total_score), row| {
        let weight = if row.weight() < 0.0 {
            row.score()
        } else {
            row.weight()
        };
        (total_weight + weight, total_score + row.score())
    })
}

fn summary_for<'a, I>(aspect: &str, rows: I) -> AspectSummary
where
    I: IntoIterator<Item = &'a PenilaianRow>,
{
    let rows: Vec<&PenilaianRow> = rows.into_iter().collect();
    let (total_weight, total_score) = aggregate(rows.iter().copied());

    AspectSummary {
        aspect: aspect.to_string(),
        year: None,
        indicator_count: rows.len(),
        total_weight,
        total_score,
        achievement: achievement(total_weight, total_score),
        classification: classify(total_weight, total_score),
    }
}

/// Sammanfattning per aspekt, i ordningen aspekterna först förekommer
pub fn summarize_aspects(rows: &[PenilaianRow]) -> Vec<AspectSummary> {
    let mut order: Vec<&str> = Vec::new();
    for row in rows {
        if !order.contains(&row.aspect.as_str()) {
            order.push(&row.aspect);
        }
    }

    order
        .into_iter()
        .map(|aspect| summary_for(aspect, rows.iter().filter(|r| r.aspect == aspect)))
        .collect()
}

/// Totalrad för hela bedömningen
pub fn overall_summary(rows: &[PenilaianRow]) -> AspectSummary {
    summary_for("TOTAL", rows.iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_weight_is_full_credit() {
        for score in [-5.0, 0.0, 3.0, 1000.0] {
            assert_eq!(achievement(0.0, score), 100);
            assert_eq!(classify(0.0, score), Classification::VeryGood);
        }
    }

    #[test]
    fn test_positive_weight() {
        assert_eq!(achievement(100.0, 85.0), 85);
        assert_eq!(achievement(100.0, 0.0), 0);
        assert_eq!(achievement(200.0, 100.0), 50);
        // Ingen övre gräns
        assert_eq!(achievement(10.0, 25.0), 250);
        // Avrundning halva uppåt, även för negativa värden
        assert_eq!(achievement(8.0, 1.0), 13);
        assert_eq!(achievement(8.0, -1.0), -12);
    }

    #[test]
    fn test_negative_weight() {
        assert_eq!(achievement(-10.0, 0.0), 0);
        assert_eq!(classify(-10.0, 0.0), Classification::VeryGood);

        assert_eq!(achievement(-10.0, 5.0), -50);
        assert_eq!(classify(-10.0, 5.0), Classification::Poor);

        assert_eq!(achievement(-10.0, 20.0), -100);
        assert_eq!(classify(-10.0, 20.0), Classification::Poor);

        // Negativ skor räknas på absolutbelopp
        assert_eq!(achievement(-10.0, -3.0), -30);
    }

    #[test]
    fn test_classification_boundaries() {
        let cases = [
            (86, Classification::VeryGood),
            (85, Classification::Good),
            (76, Classification::Good),
            (75, Classification::FairlyGood),
            (61, Classification::FairlyGood),
            (60, Classification::Poor),
            (51, Classification::Poor),
            (50, Classification::VeryPoor),
            (0, Classification::VeryPoor),
        ];

        for (score, expected) in cases {
            assert_eq!(achievement(100.0, score as f64), score);
            assert_eq!(classify(100.0, score as f64), expected, "capaian {}", score);
        }

        assert_eq!(Classification::from_achievement(-20), Classification::VeryPoor);
    }

    #[test]
    fn test_aggregation_folds_negative_weight_rows() {
        let rows = vec![
            PenilaianRow::new("Komitmen", "Indikator A", 50.0, 40.0),
            PenilaianRow::new("Komitmen", "Pelanggaran", -5.0, 2.0),
        ];

        let (total_weight, total_score) = aggregate(&rows);
        assert_eq!(total_weight, 52.0);
        assert_eq!(total_score, 42.0);

        let summaries = summarize_aspects(&rows);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].indicator_count, 2);
        assert_eq!(summaries[0].achievement, 81);
        assert_eq!(summaries[0].classification, Classification::Good);
    }

    #[test]
    fn test_summaries_keep_first_appearance_order() {
        let rows = vec![
            PenilaianRow::new("Pengungkapan", "A", 10.0, 10.0),
            PenilaianRow::new("Komitmen", "B", 10.0, 5.0),
            PenilaianRow::new("Pengungkapan", "C", 10.0, 0.0),
        ];

        let summaries = summarize_aspects(&rows);
        let aspects: Vec<&str> = summaries.iter().map(|s| s.aspect.as_str()).collect();
        assert_eq!(aspects, vec!["Pengungkapan", "Komitmen"]);
        assert_eq!(summaries[0].achievement, 50);
        assert_eq!(summaries[0].classification, Classification::VeryPoor);

        let overall = overall_summary(&rows);
        assert_eq!(overall.total_weight, 30.0);
        assert_eq!(overall.total_score, 15.0);
        assert_eq!(overall.indicator_count, 3);
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        for (weight, score) in [(100.0, 77.0), (-4.0, 1.0), (0.0, 9.0), (3.0, -1.0)] {
            assert_eq!(achievement(weight, score), achievement(weight, score));
            assert_eq!(classify(weight, score), classify(weight, score));
        }
    }
}
