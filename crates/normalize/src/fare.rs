//! Fare calculation lines, commissions and fare-quote grouping.

use std::collections::BTreeMap;

use classify::ClassifiedError;
use document::{tags, Node};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::fields::{invalid, optional};
use crate::model::{Commission, CommissionCode, FareCalculation, FareQuote, PricingInfo};

static FARE_CALC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(.+?)END(\s|$)").expect("regex for fare calculation lines"));
static FARE_ORIGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{3})\s").expect("regex for fare calculation origin"));
static ROE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ROE((?:\d+\.)?\d+)").expect("regex for rate of exchange"));

const PERCENT_BASE: &str = "PercentBase";

/// Parse a fare-calculation line such as
/// `KBP PS X/AMS PS LON 100.00NUC100.00END ROE1.0`.
pub fn parse_fare_calculation(line: &str) -> Result<FareCalculation, ClassifiedError> {
    let caps = FARE_CALC
        .captures(line.trim())
        .ok_or_else(|| invalid("fare calculation", line))?;
    let content = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let fare_calc = content.replace("(.)", ".").replace("(,)", ".").trim().to_string();

    let origin = FARE_ORIGIN
        .captures(&fare_calc)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let roe = ROE
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());

    Ok(FareCalculation {
        fare_calc,
        origin,
        roe,
    })
}

/// Read an `air:Commission` element.
pub fn parse_commission(node: &Node<'_>) -> Result<Commission, ClassifiedError> {
    let kind = optional(node, "Type").unwrap_or_default();
    if kind == PERCENT_BASE {
        let raw = node.required_attr("Percentage")?;
        let value = raw.trim().parse::<f64>().map_err(|_| invalid("Percentage", &raw))?;
        return Ok(Commission {
            code: CommissionCode::Percent,
            value,
        });
    }

    let raw = node.required_attr("Amount")?;
    let amount = raw.trim().get(3..).unwrap_or_default();
    let value = amount.parse::<f64>().map_err(|_| invalid("Amount", &raw))?;
    Ok(Commission {
        code: CommissionCode::Amount,
        value,
    })
}

/// Read an optional `air:FareCalc` child.
pub fn fare_calculation_of(node: &Node<'_>) -> Result<Option<FareCalculation>, ClassifiedError> {
    match node.child(tags::FARE_CALC).and_then(|calc| calc.text()) {
        None => Ok(None),
        Some(line) if line.trim().is_empty() => Ok(None),
        Some(line) => parse_fare_calculation(&line).map(Some),
    }
}

/// Group pricing records into fare quotes.
///
/// Groups keep first-appearance order, are stably sorted by the effective date
/// of their first fare component (undated groups last) and indexed from 1.
pub fn group_fare_quotes(pricing: Vec<(String, PricingInfo)>) -> Vec<FareQuote> {
    let mut groups: Vec<(String, Vec<PricingInfo>)> = Vec::new();
    for (group, info) in pricing {
        match groups.iter_mut().find(|(key, _)| *key == group) {
            Some((_, members)) => members.push(info),
            None => groups.push((group, vec![info])),
        }
    }

    let mut quotes = groups
        .into_iter()
        .map(|(group, pricing_infos)| {
            let effective_date = pricing_infos
                .first()
                .and_then(|p| p.fare_components.first())
                .and_then(|f| f.effective_date);
            let mut passenger_counts: BTreeMap<String, usize> = BTreeMap::new();
            for info in &pricing_infos {
                for (code, count) in &info.passenger_counts {
                    *passenger_counts.entry(code.clone()).or_default() += count;
                }
            }
            FareQuote {
                index: 0,
                group,
                effective_date,
                passenger_counts,
                pricing_infos,
            }
        })
        .collect::<Vec<_>>();

    quotes.sort_by_key(|quote| (quote.effective_date.is_none(), quote.effective_date));
    for (position, quote) in quotes.iter_mut().enumerate() {
        quote.index = position + 1;
    }
    quotes
}
