//! Gradient shading and HTML rendering tests.

use gas_cash::style::{render_term_bible_html, GradientScale};
use gas_cash::TermBibleRow;

fn scale_1_to_5() -> GradientScale {
    GradientScale::from_values([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap()
}

#[test]
fn percentiles_interpolate_linearly() {
    let scale = scale_1_to_5();
    assert_eq!(scale.min, 1.0);
    assert_eq!(scale.q25, 2.0);
    assert_eq!(scale.q75, 4.0);
    assert_eq!(scale.max, 5.0);

    let scale = GradientScale::from_values([0.0, 10.0]).unwrap();
    assert_eq!(scale.q25, 2.5);
    assert_eq!(scale.q75, 7.5);
}

#[test]
fn non_finite_values_are_ignored() {
    let scale = GradientScale::from_values([f64::NAN, 1.0, 3.0, f64::INFINITY]).unwrap();
    assert_eq!(scale.min, 1.0);
    assert_eq!(scale.max, 3.0);

    assert!(GradientScale::from_values([f64::NAN]).is_none());
    assert!(GradientScale::from_values(Vec::<f64>::new()).is_none());
}

#[test]
fn upper_band_shades_green() {
    let scale = scale_1_to_5();

    let at_q75 = scale.cell_style(Some(4.0));
    assert_eq!(at_q75.background, "#66BB6A");
    assert_eq!(at_q75.color, Some("black"));

    let at_max = scale.cell_style(Some(5.0));
    assert_eq!(at_max.background, "#1B5E20");
    assert_eq!(at_max.color, Some("white"));
}

#[test]
fn lower_band_shades_red() {
    let scale = scale_1_to_5();

    let at_q25 = scale.cell_style(Some(2.0));
    assert_eq!(at_q25.background, "#EF5350");
    assert_eq!(at_q25.color, Some("black"));

    let at_min = scale.cell_style(Some(1.0));
    assert_eq!(at_min.background, "#B71C1C");
    assert_eq!(at_min.color, Some("white"));
}

#[test]
fn middle_band_is_white_with_black_text() {
    let style = scale_1_to_5().cell_style(Some(3.0));
    assert_eq!(style.background, "white");
    assert_eq!(style.css(), "background-color: white; color: black");
}

#[test]
fn halfway_mixes_channels() {
    let style = scale_1_to_5().cell_style(Some(4.5));
    assert_eq!(style.background, "#408C45");
    assert_eq!(style.color, Some("black"));
}

#[test]
fn missing_values_are_plain_white() {
    let scale = scale_1_to_5();
    for value in [None, Some(f64::NAN)] {
        let style = scale.cell_style(value);
        assert_eq!(style.background, "white");
        assert_eq!(style.color, None);
        assert_eq!(style.css(), "background-color: white");
    }
}

#[test]
fn constant_values_use_the_near_shade() {
    let scale = GradientScale::from_values([3.0, 3.0, 3.0]).unwrap();
    let style = scale.cell_style(Some(3.0));
    assert_eq!(style.background, "#66BB6A");
    assert_eq!(style.color, Some("black"));
}

#[test]
fn html_has_blank_year_header_and_bold_cells() {
    let mut months = [None; 12];
    months[1] = Some(4.0);
    months[2] = Some(7.25);
    let rows = vec![
        TermBibleRow {
            year: "2024".to_string(),
            months: {
                let mut m = [None; 12];
                m[11] = Some(3.0);
                m
            },
        },
        TermBibleRow {
            year: "2025".to_string(),
            months,
        },
    ];

    let html = render_term_bible_html(&rows);
    assert!(html.starts_with("<table class=\"term-bible\">"));
    assert!(html.contains("<tr><th></th><th>Jan</th><th>Feb</th>"));
    assert!(html.contains("<th>Dec</th></tr>"));
    assert!(html.contains("<td style=\"font-weight: bold\">2025</td>"));
    assert!(html.contains(">7.250</td>"));
    assert!(html.contains(
        "<td style=\"background-color: #1B5E20; color: white; font-weight: bold\">7.250</td>"
    ));
    assert!(html.contains(
        "<td style=\"background-color: #B71C1C; color: white; font-weight: bold\">3.000</td>"
    ));
    assert!(html.contains("<td style=\"background-color: white; font-weight: bold\"></td>"));
    assert_eq!(html.matches("<tr><td").count(), 2);
}

#[test]
fn empty_term_bible_renders_header_only() {
    let html = render_term_bible_html(&[]);
    assert!(html.contains("<thead>"));
    assert!(html.contains("<tbody>\n</tbody>"));
}
