mod engine;
pub mod types;

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::core::format::{fixed, money};
use crate::core::{
    CalcError, Calculator, Example, FieldKind, Fields, InputField, Meta, OutputField,
    Registration, Rule,
};

pub use engine::{
    break_even_price, calculate, compare_strategies, greeks, implied_volatility,
    intrinsic_value, max_loss, max_profit, probability_of_profit, scenarios, value_at_price,
};
pub use types::{Greeks, OptionType, StockOptionsInputs, StockOptionsResults, Strategy};

pub struct StockOptions;

const OPTION_TYPES: &[&str] = &["call", "put"];
const STRATEGIES: &[&str] = &[
    "long-call",
    "long-put",
    "short-call",
    "short-put",
    "covered-call",
    "protective-put",
    "bull-spread",
    "bear-spread",
];

pub fn registration() -> Registration {
    Registration::of::<StockOptions>()
}

fn is_spread(fields: &Fields<'_>) -> bool {
    matches!(fields.text("strategy"), Some("bull-spread" | "bear-spread"))
}

impl Calculator for StockOptions {
    type Input = StockOptionsInputs;
    type Output = StockOptionsResults;

    fn meta() -> Meta {
        Meta {
            id: "stock-options",
            title: "Stock Options Calculator",
            category: "finance",
            subcategory: "investment",
            description: "Prices an option position with approximate Greeks, payoff bounds and \
                          price scenarios",
        }
    }

    fn inputs() -> Vec<InputField> {
        vec![
            InputField::select("optionType", "Option Type", OPTION_TYPES)
                .required()
                .default_value("call"),
            InputField::currency("strikePrice", "Strike Price")
                .required()
                .range(0.01, 10_000.0),
            InputField::currency("currentStockPrice", "Current Stock Price")
                .required()
                .range(0.01, 10_000.0),
            InputField::currency("optionPrice", "Option Price")
                .required()
                .range(0.0, 1_000.0),
            InputField::date("expirationDate", "Expiration Date"),
            InputField::integer("numberOfContracts", "Number of Contracts")
                .required()
                .range(1.0, 10_000.0)
                .default_value(1),
            InputField::integer("contractsPerOption", "Shares per Contract")
                .range(1.0, 1_000_000.0)
                .default_value(100),
            InputField::percentage("volatility", "Volatility")
                .required()
                .range(0.1, 500.0),
            InputField::percentage("riskFreeRate", "Risk-Free Rate")
                .required()
                .range(-10.0, 50.0),
            InputField::percentage("dividendYield", "Dividend Yield").range(0.0, 50.0),
            InputField::select("strategy", "Strategy", STRATEGIES)
                .required()
                .default_value("long-call"),
            InputField::integer("daysToExpiration", "Days to Expiration")
                .required()
                .range(0.0, 3_650.0),
            InputField::currency("secondStrikePrice", "Second Strike Price")
                .range(0.01, 10_000.0),
            InputField::currency("secondOptionPrice", "Second Option Price").range(0.0, 1_000.0),
            InputField::percentage("impliedVolatility", "Implied Volatility").range(0.1, 500.0),
            InputField::percentage("historicalVolatility", "Historical Volatility")
                .range(0.1, 500.0),
            InputField::currency("portfolioValue", "Portfolio Value").range(0.0, 100_000_000.0),
        ]
    }

    fn outputs() -> Vec<OutputField> {
        vec![
            OutputField::new("totalCost", "Total Cost", FieldKind::Currency),
            OutputField::new("profitLoss", "Profit/Loss", FieldKind::Currency),
            OutputField::new("returnPercentage", "Return", FieldKind::Percentage),
            OutputField::new("intrinsicValue", "Intrinsic Value", FieldKind::Currency),
            OutputField::new("timeValue", "Time Value", FieldKind::Currency),
            OutputField::new("delta", "Delta", FieldKind::Number),
            OutputField::new("gamma", "Gamma", FieldKind::Number),
            OutputField::new("theta", "Theta", FieldKind::Number),
            OutputField::new("vega", "Vega", FieldKind::Number),
            OutputField::new("rho", "Rho", FieldKind::Number),
            OutputField::new("maxLoss", "Maximum Loss", FieldKind::Currency),
            OutputField::new("maxProfit", "Maximum Profit", FieldKind::Currency),
            OutputField::new("breakEvenPrice", "Break-Even Price", FieldKind::Currency),
            OutputField::new(
                "probabilityOfProfit",
                "Probability of Profit",
                FieldKind::Percentage,
            ),
            OutputField::new("scenarios", "Price Scenarios", FieldKind::List),
        ]
    }

    fn rules() -> Vec<Rule> {
        vec![
            Rule::required("optionType", "Option type is required"),
            Rule::one_of("optionType", OPTION_TYPES, "Option type must be call or put"),
            Rule::required("strikePrice", "Strike price is required"),
            Rule::range(
                "strikePrice",
                0.01,
                10_000.0,
                "Strike price must be between $0.01 and $10,000",
            ),
            Rule::required("currentStockPrice", "Current stock price is required"),
            Rule::range(
                "currentStockPrice",
                0.01,
                10_000.0,
                "Current stock price must be between $0.01 and $10,000",
            ),
            Rule::required("optionPrice", "Option price is required"),
            Rule::range(
                "optionPrice",
                0.0,
                1_000.0,
                "Option price must be between $0 and $1,000",
            ),
            Rule::cross(
                "optionPrice",
                "Option price seems high relative to stock and strike prices",
                |f| match (
                    f.number("optionPrice"),
                    f.number("currentStockPrice"),
                    f.number("strikePrice"),
                ) {
                    (Some(price), Some(stock), Some(strike)) => price <= stock.max(strike) * 0.5,
                    _ => true,
                },
            )
            .warning(),
            Rule::cross(
                "strikePrice",
                "Strike price is far from current stock price",
                |f| match (f.number("strikePrice"), f.number("currentStockPrice")) {
                    (Some(strike), Some(stock)) if stock > 0.0 => {
                        (0.1..=10.0).contains(&(strike / stock))
                    }
                    _ => true,
                },
            )
            .warning(),
            Rule::required("numberOfContracts", "Number of contracts is required"),
            Rule::range(
                "numberOfContracts",
                1.0,
                10_000.0,
                "Number of contracts must be between 1 and 10,000",
            ),
            Rule::cross(
                "numberOfContracts",
                "Number of contracts must be a whole number",
                |f| f.number("numberOfContracts").is_none_or(|v| v.fract() == 0.0),
            ),
            Rule::range(
                "contractsPerOption",
                1.0,
                1_000_000.0,
                "Shares per contract must be between 1 and 1,000,000",
            ),
            Rule::required("volatility", "Volatility is required"),
            Rule::range(
                "volatility",
                0.1,
                500.0,
                "Volatility must be between 0.1% and 500%",
            ),
            Rule::cross(
                "volatility",
                "At-the-money volatility is usually between 10% and 100%",
                |f| match (
                    f.number("volatility"),
                    f.number("currentStockPrice"),
                    f.number("strikePrice"),
                ) {
                    (Some(vol), Some(stock), Some(strike)) if stock > 0.0 && strike > 0.0 => {
                        (stock / strike).ln().abs() >= 0.1 || (10.0..=100.0).contains(&vol)
                    }
                    _ => true,
                },
            )
            .warning(),
            Rule::required("riskFreeRate", "Risk-free rate is required"),
            Rule::range(
                "riskFreeRate",
                -10.0,
                50.0,
                "Risk-free rate must be between -10% and 50%",
            ),
            Rule::range(
                "dividendYield",
                0.0,
                50.0,
                "Dividend yield must be between 0% and 50%",
            ),
            Rule::required("strategy", "Strategy is required"),
            Rule::one_of("strategy", STRATEGIES, "Invalid option strategy"),
            Rule::cross(
                "strategy",
                "Strategy does not match the option type",
                |f| match (f.text("strategy"), f.text("optionType")) {
                    (Some("long-call" | "short-call" | "covered-call"), Some(kind)) => {
                        kind == "call"
                    }
                    (Some("long-put" | "short-put" | "protective-put"), Some(kind)) => {
                        kind == "put"
                    }
                    _ => true,
                },
            )
            .warning(),
            Rule::required("daysToExpiration", "Days to expiration is required"),
            Rule::range(
                "daysToExpiration",
                0.0,
                3_650.0,
                "Days to expiration must be between 0 and 3,650",
            ),
            Rule::cross(
                "expirationDate",
                "Expiration date must be a valid YYYY-MM-DD date",
                |f| {
                    f.get("expirationDate").is_none()
                        || f.text("expirationDate").is_some_and(|s| {
                            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_ok()
                        })
                },
            ),
            Rule::range(
                "secondStrikePrice",
                0.01,
                10_000.0,
                "Second strike price must be between $0.01 and $10,000",
            ),
            Rule::cross(
                "secondStrikePrice",
                "Spread strategies require a second strike price",
                |f| !is_spread(f) || f.number("secondStrikePrice").is_some(),
            )
            .full_only(),
            Rule::cross(
                "secondStrikePrice",
                "Second strike price should be different from first strike price for spread strategies",
                |f| {
                    !is_spread(f)
                        || match (f.number("secondStrikePrice"), f.number("strikePrice")) {
                            (Some(second), Some(first)) => second != first,
                            _ => true,
                        }
                },
            ),
            Rule::range(
                "secondOptionPrice",
                0.0,
                1_000.0,
                "Second option price must be between $0 and $1,000",
            ),
            Rule::range(
                "impliedVolatility",
                0.1,
                500.0,
                "Implied volatility must be between 0.1% and 500%",
            ),
            Rule::range(
                "historicalVolatility",
                0.1,
                500.0,
                "Historical volatility must be between 0.1% and 500%",
            ),
            Rule::range(
                "portfolioValue",
                0.0,
                100_000_000.0,
                "Portfolio value must be between $0 and $100,000,000",
            ),
            Rule::cross(
                "portfolioValue",
                "Position size should not exceed 50% of portfolio value",
                |f| {
                    let Some(portfolio) = f.number("portfolioValue").filter(|p| *p > 0.0) else {
                        return true;
                    };
                    let cost = f.number("numberOfContracts").unwrap_or(1.0)
                        * f.number("contractsPerOption").unwrap_or(100.0)
                        * f.number("optionPrice").unwrap_or(0.0);
                    cost <= portfolio * 0.5
                },
            )
            .warning(),
        ]
    }

    fn calculate(input: &StockOptionsInputs) -> Result<StockOptionsResults, CalcError> {
        Ok(engine::calculate(input))
    }

    fn report(input: &StockOptionsInputs, output: &StockOptionsResults) -> String {
        let mut out = String::from("# Stock Options Analysis Report\n\n");

        let _ = writeln!(out, "## Position Overview\n");
        let _ = writeln!(out, "- **Strategy:** {}", input.strategy.label());
        let _ = writeln!(out, "- **Option Type:** {}", input.option_type.label());
        let _ = writeln!(out, "- **Strike Price:** {}", money(input.strike_price));
        let _ = writeln!(
            out,
            "- **Current Stock Price:** {}",
            money(input.current_stock_price)
        );
        let _ = writeln!(out, "- **Option Price:** {}", money(input.option_price));
        let _ = writeln!(
            out,
            "- **Contracts:** {} x {} shares",
            input.number_of_contracts, input.contracts_per_option
        );
        if let Some(expiration) = input.expiration_date {
            let _ = writeln!(out, "- **Expiration:** {expiration}");
        }

        let _ = writeln!(out, "\n## Key Metrics\n");
        let _ = writeln!(out, "- **Total Cost:** {}", money(output.total_cost));
        let _ = writeln!(out, "- **Profit/Loss:** {}", money(output.profit_loss));
        let _ = writeln!(out, "- **Return:** {}%", fixed(output.return_percentage, 2));
        let _ = writeln!(out, "- **Max Loss:** {}", money(output.max_loss));
        let _ = writeln!(out, "- **Max Profit:** {}", money(output.max_profit));
        let _ = writeln!(out, "- **Break Even:** {}", money(output.break_even_price));

        let _ = writeln!(out, "\n## Risk Analysis\n");
        let _ = writeln!(
            out,
            "- **Probability of Profit:** {}%",
            fixed(output.probability_of_profit, 1)
        );
        let _ = writeln!(out, "- **Risk Level:** {}", output.strategy_risk);
        let _ = writeln!(
            out,
            "- **Time Decay:** {} over 30 days, {} days to expiration",
            money(output.time_decay),
            input.days_to_expiration
        );
        if output.margin_requirement > 0.0 {
            let _ = writeln!(
                out,
                "- **Margin Requirement:** {}",
                money(output.margin_requirement)
            );
        }

        let _ = writeln!(out, "\n## Greeks Analysis\n");
        let _ = writeln!(out, "- **Delta:** {}", fixed(output.greeks.delta, 3));
        let _ = writeln!(out, "- **Gamma:** {}", fixed(output.greeks.gamma, 4));
        let _ = writeln!(out, "- **Theta:** {}", fixed(output.greeks.theta, 2));
        let _ = writeln!(out, "- **Vega:** {}", fixed(output.greeks.vega, 2));
        let _ = writeln!(out, "- **Rho:** {}", fixed(output.greeks.rho, 2));

        let _ = writeln!(out, "\n## Price Scenarios\n");
        let _ = writeln!(out, "| Move | Stock | Option | P/L |");
        let _ = writeln!(out, "|------|-------|--------|-----|");
        for s in &output.scenarios {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                s.scenario,
                money(s.stock_price),
                money(s.option_value),
                money(s.profit_loss)
            );
        }

        let _ = writeln!(out, "\n## Strategy Assessment\n");
        let _ = writeln!(
            out,
            "- {}",
            if output.profit_loss > 0.0 {
                "Profitable position"
            } else {
                "Position at a loss or flat"
            }
        );
        let _ = writeln!(
            out,
            "- {}",
            if output.probability_of_profit > 60.0 {
                "High probability of profit"
            } else if output.probability_of_profit > 40.0 {
                "Moderate probability of profit"
            } else {
                "Low probability of profit"
            }
        );

        let _ = writeln!(out, "\n## Recommendations\n");
        for rec in &output.recommendations {
            let _ = writeln!(out, "- {rec}");
        }
        if !output.risk_factors.is_empty() {
            let _ = writeln!(out, "\n## Risk Factors\n");
            for risk in &output.risk_factors {
                let _ = writeln!(out, "- {risk}");
            }
        }
        out
    }

    fn examples() -> Vec<Example> {
        vec![
            Example {
                title: "In-the-money long call",
                description: "One contract, 45 days out, stock $10 above the strike",
                inputs: long_call(),
            },
            Example {
                title: "Cash-secured short put",
                description: "Selling premium below the market",
                inputs: json!({
                    "optionType": "put",
                    "strikePrice": 95,
                    "currentStockPrice": 102,
                    "optionPrice": 2.4,
                    "numberOfContracts": 5,
                    "contractsPerOption": 100,
                    "volatility": 28,
                    "riskFreeRate": 4,
                    "dividendYield": 0,
                    "strategy": "short-put",
                    "daysToExpiration": 30,
                    "portfolioValue": 250000
                }),
            },
            Example {
                title: "Bull call spread",
                description: "Long the 100 call, short the 110 call",
                inputs: json!({
                    "optionType": "call",
                    "strikePrice": 100,
                    "currentStockPrice": 104,
                    "optionPrice": 6.5,
                    "numberOfContracts": 2,
                    "contractsPerOption": 100,
                    "volatility": 32,
                    "riskFreeRate": 3,
                    "dividendYield": 1,
                    "strategy": "bull-spread",
                    "daysToExpiration": 60,
                    "secondStrikePrice": 110,
                    "secondOptionPrice": 2.5,
                    "portfolioValue": 50000
                }),
            },
        ]
    }
}

fn long_call() -> Value {
    json!({
        "optionType": "call",
        "strikePrice": 100,
        "currentStockPrice": 110,
        "optionPrice": 15,
        "expirationDate": "2024-12-20",
        "numberOfContracts": 1,
        "contractsPerOption": 100,
        "volatility": 30,
        "riskFreeRate": 2.5,
        "dividendYield": 1.5,
        "strategy": "long-call",
        "daysToExpiration": 45,
        "portfolioValue": 100000
    })
}

#[cfg(test)]
pub(crate) fn sample_inputs() -> StockOptionsInputs {
    serde_json::from_value(long_call()).expect("fixture decodes")
}
