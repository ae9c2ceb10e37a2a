//! One line per detected item: name, average sell price and ducat value.

use std::fmt;
use std::io::Write;

use anyhow::Result;

use crate::catalog::{CatalogItem, MarketClient, TopOrders};

/// Current market orders for an item.
pub trait PriceSource {
    fn top_orders(&self, slug: &str) -> Result<TopOrders>;
}

impl PriceSource for MarketClient {
    fn top_orders(&self, slug: &str) -> Result<TopOrders> {
        self.fetch_top_orders(slug)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Price {
    /// Mean platinum of the listed sell orders.
    Average(f64),
    /// Nobody is selling.
    NoOrders,
    /// Not looked up, or the lookup failed.
    Unknown,
}

impl Price {
    pub fn from_orders(orders: &TopOrders) -> Self {
        if orders.sell.is_empty() {
            return Price::NoOrders;
        }
        let total: i64 = orders.sell.iter().map(|o| o.platinum as i64).sum();
        Price::Average(total as f64 / orders.sell.len() as f64)
    }
}

/// A report line.
#[derive(Debug, Clone)]
pub struct ItemReport<'a> {
    pub item: &'a CatalogItem,
    pub price: Price,
}

impl fmt::Display for ItemReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.price {
            Price::Average(p) => write!(
                f,
                "{} - {:.2}p, {} ducats",
                self.item.name, p, self.item.ducats
            ),
            Price::NoOrders => write!(f, "{} - n/a, {} ducats", self.item.name, self.item.ducats),
            Price::Unknown => write!(f, "{}, {} ducats", self.item.name, self.item.ducats),
        }
    }
}

/// Looks up the price of `item`. Failures are logged, not returned.
pub fn price_of(source: &dyn PriceSource, item: &CatalogItem) -> Price {
    match source.top_orders(&item.slug) {
        Ok(orders) => Price::from_orders(&orders),
        Err(e) => {
            log::error!("Unable to fetch price information for {}: {:#}", item.slug, e);
            Price::Unknown
        }
    }
}

/// Writes one line per item, with prices when `prices` is given.
pub fn write_report(
    out: &mut dyn Write,
    items: &[&CatalogItem],
    prices: Option<&dyn PriceSource>,
) -> Result<()> {
    if items.is_empty() {
        writeln!(out, "No items recognized")?;
        return Ok(());
    }
    for &item in items {
        let price = match prices {
            Some(source) => price_of(source, item),
            None => Price::Unknown,
        };
        writeln!(out, "{}", ItemReport { item, price })?;
    }
    Ok(())
}
