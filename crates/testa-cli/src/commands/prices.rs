use anyhow::{Result, bail};
use testa_core::pricing::{self, MODEL_PRICES};

pub fn run(model: Option<&str>) -> Result<()> {
    let rows: Vec<_> = match model {
        Some(name) => match pricing::price_for(name) {
            Some(price) => vec![(name, price)],
            None => bail!("No price known for model '{name}'"),
        },
        None => MODEL_PRICES.iter().map(|(name, price)| (*name, *price)).collect(),
    };

    for (name, price) in rows {
        println!("{name}");
        println!("  input:  {}", pricing::format_price(price.input_per_1k));
        println!("  output: {}", pricing::format_price(price.output_per_1k));
    }
    Ok(())
}
