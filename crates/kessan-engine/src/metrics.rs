//! Pure derivation functions over already-present figures.
//!
//! Callers are responsible for presence checks; these functions only
//! guard the denominators, so no path can produce NaN or an infinity.

/// Realized figure against full-year forecast, as a percentage.
pub fn progress_rate(actual: f64, forecast: f64) -> Option<f64> {
    if forecast != 0.0 {
        Some(actual / forecast * 100.0)
    } else {
        None
    }
}

/// Year-over-year growth, as a percentage of the prior figure.
pub fn yoy_growth(current: f64, prior: f64) -> Option<f64> {
    if prior != 0.0 {
        Some((current - prior) / prior * 100.0)
    } else {
        None
    }
}

/// Profit over sales, as a percentage.
pub fn margin(profit: f64, net_sales: f64) -> Option<f64> {
    if net_sales != 0.0 {
        Some(profit / net_sales * 100.0)
    } else {
        None
    }
}

/// Current assets over current liabilities, as a percentage.
pub fn current_ratio(current_assets: f64, current_liabilities: f64) -> Option<f64> {
    if current_liabilities != 0.0 {
        Some(current_assets / current_liabilities * 100.0)
    } else {
        None
    }
}

/// Interest-bearing debt over net assets. Net assets stand in for
/// equity; minority interests are not split out at this boundary.
pub fn de_ratio(interest_bearing_debt: f64, total_net_assets: f64) -> Option<f64> {
    if total_net_assets != 0.0 {
        Some(interest_bearing_debt / total_net_assets)
    } else {
        None
    }
}

/// Operating plus investing cash flow. Investing flow is conventionally
/// negative for growth spend, so this is effectively a subtraction.
pub fn free_cash_flow(operating_cf: f64, investment_cf: f64) -> f64 {
    operating_cf + investment_cf
}

pub fn per(price: f64, eps: f64) -> Option<f64> {
    if eps != 0.0 {
        Some(price / eps)
    } else {
        None
    }
}

pub fn pbr(price: f64, bps: f64) -> Option<f64> {
    if bps != 0.0 {
        Some(price / bps)
    } else {
        None
    }
}

/// PER against EPS growth. Only meaningful for positive growth.
pub fn peg(per: f64, eps_growth: f64) -> Option<f64> {
    if eps_growth > 0.0 {
        Some(per / eps_growth)
    } else {
        None
    }
}
