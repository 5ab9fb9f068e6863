//! Simplified option metrics. The Greeks and probabilities here are cheap
//! closed-form approximations driven by moneyness, volatility and time to
//! expiry; they are not Black-Scholes values.

use std::f64::consts::PI;

use super::types::*;

const DAYS_PER_YEAR: f64 = 365.0;
const SCENARIO_MOVES: [f64; 8] = [-0.2, -0.1, -0.05, 0.0, 0.05, 0.1, 0.2, 0.3];
const MARGIN_RATE: f64 = 0.2;
const SKEW_THRESHOLD: f64 = 10.0;

/// Years to expiry, floored at one day so expiring positions stay finite.
fn time_to_expiry(inputs: &StockOptionsInputs) -> f64 {
    inputs.days_to_expiration.max(1.0) / DAYS_PER_YEAR
}

fn shares(inputs: &StockOptionsInputs) -> f64 {
    inputs.number_of_contracts * inputs.contracts_per_option
}

fn moneyness(inputs: &StockOptionsInputs) -> f64 {
    (inputs.current_stock_price / inputs.strike_price).ln()
}

pub fn total_cost(inputs: &StockOptionsInputs) -> f64 {
    shares(inputs) * inputs.option_price
}

pub fn intrinsic_value(option_type: OptionType, stock_price: f64, strike: f64) -> f64 {
    match option_type {
        OptionType::Call => (stock_price - strike).max(0.0),
        OptionType::Put => (strike - stock_price).max(0.0),
    }
}

fn current_intrinsic(inputs: &StockOptionsInputs) -> f64 {
    intrinsic_value(
        inputs.option_type,
        inputs.current_stock_price,
        inputs.strike_price,
    )
}

fn position_value(inputs: &StockOptionsInputs) -> f64 {
    let value = total_cost(inputs);
    match inputs.strategy {
        Strategy::ShortCall | Strategy::ShortPut => -value,
        Strategy::BullSpread | Strategy::BearSpread => {
            match (inputs.second_strike_price, inputs.second_option_price) {
                (Some(strike), Some(price)) if strike != 0.0 && price != 0.0 => {
                    value - shares(inputs) * price
                }
                _ => 0.0,
            }
        }
        _ => value,
    }
}

/// Rough volatility implied by the time value, in percent, clamped to 5..=200.
pub fn implied_volatility(inputs: &StockOptionsInputs) -> f64 {
    let time_value = (inputs.option_price - current_intrinsic(inputs)).max(0.0);
    let estimate = (2.0 * PI * time_value
        / (inputs.current_stock_price * time_to_expiry(inputs).sqrt()))
    .sqrt();
    (estimate * 100.0).clamp(5.0, 200.0)
}

pub fn greeks(inputs: &StockOptionsInputs) -> Greeks {
    let t = time_to_expiry(inputs);
    let sigma = inputs.volatility / 100.0;
    let rate = inputs.risk_free_rate / 100.0;
    let m = moneyness(inputs);
    let spread = sigma * t.sqrt();

    let bell = (-m * m / (2.0 * sigma * sigma * t)).exp();
    let gamma = bell / (inputs.current_stock_price * spread);
    let theta = -inputs.option_price * sigma * sigma / (2.0 * t.sqrt());
    let vega = inputs.current_stock_price * t.sqrt() * bell;
    let discounted = inputs.strike_price * t * (-rate * t).exp();

    let tilt = m / spread * 0.3;
    let (delta, rho) = match inputs.option_type {
        OptionType::Call => {
            let delta = (0.5 + tilt).clamp(0.0, 1.0);
            (delta, discounted * delta)
        }
        OptionType::Put => {
            let delta = (-0.5 + tilt).clamp(-1.0, 0.0);
            (delta, -discounted * delta.abs())
        }
    };

    Greeks {
        delta,
        gamma,
        theta,
        vega,
        rho,
    }
}

pub fn max_loss(inputs: &StockOptionsInputs) -> f64 {
    let n = shares(inputs);
    match inputs.strategy {
        Strategy::ShortCall => -n * (inputs.strike_price - inputs.option_price),
        Strategy::ShortPut => -n * inputs.strike_price,
        Strategy::CoveredCall => {
            -n * (inputs.current_stock_price - inputs.strike_price + inputs.option_price)
        }
        _ => -n * inputs.option_price,
    }
}

pub fn max_profit(inputs: &StockOptionsInputs) -> f64 {
    let n = shares(inputs);
    match inputs.strategy {
        Strategy::LongPut => {
            n * (inputs.strike_price - inputs.current_stock_price - inputs.option_price)
        }
        Strategy::ShortCall | Strategy::ShortPut | Strategy::CoveredCall => {
            n * inputs.option_price
        }
        Strategy::ProtectivePut => n * (inputs.current_stock_price - inputs.option_price),
        _ => n * (inputs.current_stock_price - inputs.strike_price - inputs.option_price),
    }
}

pub fn break_even_price(inputs: &StockOptionsInputs) -> f64 {
    match inputs.strategy {
        Strategy::LongPut | Strategy::ShortPut => inputs.strike_price - inputs.option_price,
        Strategy::CoveredCall => inputs.current_stock_price - inputs.option_price,
        Strategy::ProtectivePut => inputs.current_stock_price + inputs.option_price,
        _ => inputs.strike_price + inputs.option_price,
    }
}

/// `50 ± 20·d2`, clamped to a percentage.
pub fn probability_of_profit(inputs: &StockOptionsInputs) -> f64 {
    let t = time_to_expiry(inputs);
    let sigma = inputs.volatility / 100.0;
    let rate = inputs.risk_free_rate / 100.0;
    let d1 = (moneyness(inputs) + (rate + sigma * sigma / 2.0) * t) / (sigma * t.sqrt());
    let d2 = d1 - sigma * t.sqrt();
    let p = match inputs.option_type {
        OptionType::Call => 50.0 + d2 * 20.0,
        OptionType::Put => 50.0 - d2 * 20.0,
    };
    p.clamp(0.0, 100.0)
}

struct StrategyView {
    risk: &'static str,
    outlook: &'static str,
    exit: f64,
}

fn analyze_strategy(inputs: &StockOptionsInputs) -> StrategyView {
    let (s, k, p) = (
        inputs.current_stock_price,
        inputs.strike_price,
        inputs.option_price,
    );
    let short_dated = if inputs.days_to_expiration < 30.0 {
        "High"
    } else {
        "Moderate"
    };
    match inputs.strategy {
        Strategy::LongCall => StrategyView {
            risk: short_dated,
            outlook: if s > k { "Bullish" } else { "Speculative" },
            exit: k + p * 2.0,
        },
        Strategy::LongPut => StrategyView {
            risk: short_dated,
            outlook: if s < k { "Bearish" } else { "Speculative" },
            exit: k - p * 2.0,
        },
        Strategy::ShortCall => StrategyView {
            risk: "High",
            outlook: "Bearish",
            exit: k - p,
        },
        Strategy::ShortPut => StrategyView {
            risk: "High",
            outlook: "Bullish",
            exit: k + p,
        },
        Strategy::CoveredCall => StrategyView {
            risk: "Low",
            outlook: "Neutral to Bearish",
            exit: k,
        },
        Strategy::ProtectivePut => StrategyView {
            risk: "Low",
            outlook: "Bullish with Protection",
            exit: s + p,
        },
        Strategy::BullSpread | Strategy::BearSpread => StrategyView {
            risk: "Moderate",
            outlook: "Neutral",
            exit: s,
        },
    }
}

/// IV over HV by more than ten points reads as rich premium; under by more
/// than ten as cheap.
fn volatility_view(inputs: &StockOptionsInputs) -> (&'static str, &'static str) {
    match (inputs.implied_volatility, inputs.historical_volatility) {
        (Some(iv), Some(hv)) if iv != 0.0 && hv != 0.0 => {
            let skew = iv - hv;
            if skew > SKEW_THRESHOLD {
                ("High", "Volatility may decrease")
            } else if skew < -SKEW_THRESHOLD {
                ("Low", "Volatility may increase")
            } else {
                ("Moderate", "Neutral")
            }
        }
        _ => ("Moderate", "Neutral"),
    }
}

/// Per-share option value if the stock moved to `stock_price` today. Time
/// value shrinks as the option moves away from the strike.
pub fn value_at_price(inputs: &StockOptionsInputs, stock_price: f64) -> f64 {
    let intrinsic = intrinsic_value(inputs.option_type, stock_price, inputs.strike_price);
    let time_value = (inputs.option_price - current_intrinsic(inputs)).max(0.0);
    let distance = (stock_price / inputs.strike_price).ln().abs();
    intrinsic + time_value * (-distance * time_to_expiry(inputs)).exp()
}

fn scenario_probability(change: f64, volatility: f64) -> f64 {
    let z = change / (volatility / 100.0);
    let density = (-z * z / 2.0).exp() / (2.0 * PI).sqrt();
    (density * 100.0).clamp(0.0, 100.0)
}

pub fn scenarios(inputs: &StockOptionsInputs) -> Vec<Scenario> {
    let cost = total_cost(inputs);
    SCENARIO_MOVES
        .iter()
        .map(|&change| {
            let stock_price = inputs.current_stock_price * (1.0 + change);
            let option_value = value_at_price(inputs, stock_price);
            let profit_loss = option_value * shares(inputs) - cost;
            Scenario {
                scenario: format!("{:+.0}%", change * 100.0),
                stock_price,
                option_value,
                profit_loss,
                return_pct: if cost == 0.0 {
                    0.0
                } else {
                    profit_loss / cost * 100.0
                },
                probability: scenario_probability(change, inputs.volatility),
            }
        })
        .collect()
}

pub fn margin_requirement(inputs: &StockOptionsInputs) -> f64 {
    match inputs.strategy {
        Strategy::ShortCall => shares(inputs) * inputs.current_stock_price * MARGIN_RATE,
        Strategy::ShortPut => shares(inputs) * inputs.strike_price * MARGIN_RATE,
        _ => 0.0,
    }
}

fn risk_reward(max_profit: f64, max_loss: f64) -> f64 {
    if max_loss == 0.0 {
        if max_profit == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        (max_profit / max_loss).abs()
    }
}

fn recommendations(inputs: &StockOptionsInputs, profit_loss: f64, pop: f64) -> Vec<String> {
    let mut out = Vec::new();
    if profit_loss > 0.0 && pop > 70.0 {
        out.push("Consider taking partial profits to lock in gains".to_string());
    }
    if profit_loss < 0.0 && pop < 30.0 {
        out.push("Consider closing position to limit further losses".to_string());
    }
    if inputs.days_to_expiration < 7.0 {
        out.push("High time decay risk - consider rolling to further expiration".to_string());
    }
    if inputs.volatility > 50.0 {
        out.push("High volatility environment - consider volatility strategies".to_string());
    }
    if inputs.strategy.is_short() && inputs.current_stock_price > inputs.strike_price {
        out.push("Short position at risk - consider hedging or closing".to_string());
    }
    if out.is_empty() {
        out.push("Monitor position closely as expiration approaches".to_string());
    }
    out
}

fn risk_factors(inputs: &StockOptionsInputs, max_loss: f64, volatility_risk: &str) -> Vec<String> {
    let mut out = Vec::new();
    if inputs.portfolio_value > 0.0 && max_loss.abs() > inputs.portfolio_value * 0.1 {
        out.push("Position size too large relative to portfolio".to_string());
    }
    if inputs.days_to_expiration < 30.0 {
        out.push("High time decay risk".to_string());
    }
    if inputs.strategy.is_short() {
        out.push("Unlimited loss potential on short options".to_string());
    }
    if volatility_risk == "High" {
        out.push("High volatility environment increases risk".to_string());
    }
    if inputs.option_type == OptionType::Call && inputs.current_stock_price < inputs.strike_price {
        out.push("Out-of-the-money call with low probability of profit".to_string());
    }
    out
}

fn opportunities(inputs: &StockOptionsInputs, max_profit: f64, outlook: &str) -> Vec<String> {
    let mut out = Vec::new();
    if inputs.portfolio_value > 0.0 && max_profit > inputs.portfolio_value * 0.05 {
        out.push("High profit potential relative to portfolio size".to_string());
    }
    if outlook.contains("Bullish") && inputs.current_stock_price < inputs.strike_price {
        out.push("Stock has room to move above strike price".to_string());
    }
    if let (Some(iv), Some(hv)) = (inputs.implied_volatility, inputs.historical_volatility) {
        if iv > 0.0 && iv < hv {
            out.push("Options may be undervalued relative to historical volatility".to_string());
        }
    }
    if inputs.days_to_expiration > 90.0 {
        out.push("Sufficient time for position to develop".to_string());
    }
    out
}

fn market_view(inputs: &StockOptionsInputs) -> (&'static str, &'static str, &'static str) {
    let outlook = match inputs.option_type {
        OptionType::Call if inputs.current_stock_price > inputs.strike_price => "Bullish",
        OptionType::Put if inputs.current_stock_price < inputs.strike_price => "Bearish",
        _ => "Neutral",
    };
    let forecast = if inputs.volatility > 40.0 {
        "High volatility expected"
    } else if inputs.volatility < 20.0 {
        "Low volatility expected"
    } else {
        "Stable"
    };
    let timing = if inputs.days_to_expiration < 7.0 {
        "Close or roll position"
    } else if inputs.days_to_expiration < 30.0 {
        "Monitor closely"
    } else {
        "Hold"
    };
    (outlook, forecast, timing)
}

/// Textbook per-share payoffs for the four common single-leg setups.
pub fn compare_strategies(inputs: &StockOptionsInputs) -> Vec<StrategyComparison> {
    let row = |strategy, max_profit, max_loss, pop, risk_level| StrategyComparison {
        strategy,
        max_profit,
        max_loss,
        probability_of_profit: pop,
        risk_level,
    };
    vec![
        row("Long Call", f64::INFINITY, -inputs.option_price, 40.0, "High"),
        row(
            "Long Put",
            inputs.strike_price,
            -inputs.option_price,
            40.0,
            "High",
        ),
        row(
            "Covered Call",
            inputs.option_price,
            -inputs.current_stock_price,
            70.0,
            "Low",
        ),
        row(
            "Protective Put",
            f64::INFINITY,
            -inputs.option_price,
            60.0,
            "Low",
        ),
    ]
}

fn sensitivity(inputs: &StockOptionsInputs, g: &Greeks) -> Vec<Sensitivity> {
    vec![
        Sensitivity {
            factor: "Stock Price",
            current_value: inputs.current_stock_price,
            impact: g.delta,
            direction: if g.delta > 0.0 { "Positive" } else { "Negative" },
        },
        Sensitivity {
            factor: "Volatility",
            current_value: inputs.volatility,
            impact: g.vega,
            direction: "Positive",
        },
        Sensitivity {
            factor: "Time Decay",
            current_value: inputs.days_to_expiration,
            impact: g.theta,
            direction: "Negative",
        },
        Sensitivity {
            factor: "Interest Rate",
            current_value: inputs.risk_free_rate,
            impact: g.rho,
            direction: match inputs.option_type {
                OptionType::Call => "Positive",
                OptionType::Put => "Negative",
            },
        },
    ]
}

pub fn calculate(inputs: &StockOptionsInputs) -> StockOptionsResults {
    let total_cost = total_cost(inputs);
    let total_value = position_value(inputs);
    let profit_loss = total_value - total_cost;
    let return_percentage = if total_cost == 0.0 {
        0.0
    } else {
        profit_loss / total_cost * 100.0
    };

    let intrinsic = current_intrinsic(inputs);
    let greeks = greeks(inputs);
    let max_loss = max_loss(inputs);
    let max_profit = max_profit(inputs);
    let pop = probability_of_profit(inputs);
    let expected_value = pop / 100.0 * max_profit + (1.0 - pop / 100.0) * max_loss;

    let strategy = analyze_strategy(inputs);
    let (volatility_risk, volatility_opportunity) = volatility_view(inputs);
    let (market_outlook, volatility_forecast, timing_recommendation) = market_view(inputs);

    StockOptionsResults {
        total_cost,
        total_value,
        profit_loss,
        return_percentage,
        intrinsic_value: intrinsic,
        time_value: inputs.option_price - intrinsic,
        implied_volatility: implied_volatility(inputs),
        greeks,
        max_loss,
        max_profit,
        break_even_price: break_even_price(inputs),
        probability_of_profit: pop,
        expected_value,
        strategy_risk: strategy.risk,
        strategy_outlook: strategy.outlook,
        optimal_exit_price: strategy.exit,
        time_decay: greeks.theta * 30.0,
        days_to_expiration: inputs.days_to_expiration,
        expiration_impact: inputs.option_price - intrinsic,
        volatility_impact: greeks.vega,
        volatility_risk,
        volatility_opportunity,
        scenarios: scenarios(inputs),
        position_size: total_cost,
        portfolio_impact: if inputs.portfolio_value > 0.0 {
            total_cost / inputs.portfolio_value * 100.0
        } else {
            0.0
        },
        margin_requirement: margin_requirement(inputs),
        risk_reward_ratio: risk_reward(max_profit, max_loss),
        recommendations: recommendations(inputs, profit_loss, pop),
        risk_factors: risk_factors(inputs, max_loss, volatility_risk),
        opportunities: opportunities(inputs, max_profit, strategy.outlook),
        market_outlook,
        volatility_forecast,
        timing_recommendation,
        strategy_comparison: compare_strategies(inputs),
        sensitivity_analysis: sensitivity(inputs, &greeks),
    }
}
