use plotters::prelude::*;

use crate::error::{Result, RlError};

fn plot_err<E: std::fmt::Display>(e: E) -> RlError {
    RlError::Plot(e.to_string())
}

/// Line plot of per-iteration losses.
pub fn plot_losses(losses: &[f64], filename: &str, title: &str) -> Result<()> {
    let root = BitMapBackend::new(filename, (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let finite = losses.iter().copied().filter(|l| l.is_finite());
    let max_loss = finite.clone().fold(f64::MIN, f64::max).max(1e-6);
    let min_loss = finite.fold(f64::MAX, f64::min).min(0.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 32).into_font())
        .margin(30)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0..losses.len().max(1), min_loss..max_loss)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Iteration")
        .y_desc("Loss")
        .light_line_style(&WHITE.mix(0.3))
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(
            losses
                .iter()
                .enumerate()
                .filter(|(_, l)| l.is_finite())
                .map(|(i, l)| (i, *l)),
            &BLUE,
        ))
        .map_err(plot_err)?
        .label("Loss")
        .legend(|(x, y)| PathElement::new([(x, y), (x + 20, y)], &BLUE));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    tracing::info!("saved loss plot to {}", filename);
    Ok(())
}

/// Heatmap of `rows` laid out as `[value, x, y]` over a square grid of `size` points per axis.
pub fn plot_surface(rows: &[Vec<f32>], size: usize, filename: &str, title: &str) -> Result<()> {
    if size < 2 || rows.iter().any(|r| r.len() < 3) {
        return Err(RlError::Plot(
            "surface plot needs [value, x, y] rows on a grid of at least 2x2".into(),
        ));
    }

    let bounds = |col: usize| {
        rows.iter()
            .map(|r| r[col])
            .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
    };
    let (v_lo, v_hi) = bounds(0);
    let (x_lo, x_hi) = bounds(1);
    let (y_lo, y_hi) = bounds(2);
    let (dx, dy) = (
        (x_hi - x_lo) / (size - 1) as f32,
        (y_hi - y_lo) / (size - 1) as f32,
    );

    let root = BitMapBackend::new(filename, (800, 700)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (x_lo - dx / 2.0)..(x_hi + dx / 2.0),
            (y_lo - dy / 2.0)..(y_hi + dy / 2.0),
        )
        .map_err(plot_err)?;
    chart.configure_mesh().disable_mesh().draw().map_err(plot_err)?;

    let span = (v_hi - v_lo).max(f32::EPSILON);
    chart
        .draw_series(rows.iter().map(|r| {
            let t = ((r[0] - v_lo) / span) as f64;
            let color = HSLColor(0.66 * (1.0 - t), 0.8, 0.5);
            Rectangle::new(
                [
                    (r[1] - dx / 2.0, r[2] - dy / 2.0),
                    (r[1] + dx / 2.0, r[2] + dy / 2.0),
                ],
                color.filled(),
            )
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    tracing::info!("saved surface plot to {}", filename);
    Ok(())
}
