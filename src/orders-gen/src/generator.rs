//! Synthetic order stream.
//!
//! Every iteration places one order with a single line: a random customer
//! from the pool buys a random quantity of a random catalog product. Orders
//! are paced by a fixed delay and the run can be stopped between orders
//! through a shutdown channel.

use std::future::pending;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use rand::Rng;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::debug;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use crate::catalog::CatalogEntry;
use crate::customers::CustomerPool;
use crate::error::OrdersGenError;
use crate::error::Result;
use crate::orders::Order;
use crate::orders::OrderIdGenerator;
use crate::orders::OrderLine;
use crate::orders::OrderStore;

pub const MAX_QUANTITY: i32 = 99;
/// Only the first 99 products of the catalog are ever ordered.
pub const PRODUCT_INDEX_LIMIT: usize = 99;
pub const PROGRESS_EVERY: usize = 1000;

pub fn pick_quantity<R: Rng>(rng: &mut R) -> i32 {
    rng.gen_range(1..=MAX_QUANTITY)
}

/// `len` must be positive.
pub fn pick_product_index<R: Rng>(rng: &mut R, len: usize) -> usize {
    rng.gen_range(0..len.min(PRODUCT_INDEX_LIMIT))
}

async fn wait_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // nobody can signal anymore
            pending::<()>().await;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderFailure {
    pub iteration: usize,
    pub customer_id: Uuid,
    pub sku: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub requested: usize,
    pub placed: usize,
    pub failures: Vec<OrderFailure>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Config<R> {
    pub rng: R,
    pub ids: OrderIdGenerator,
    pub orders: OrderStore,
    pub customers: CustomerPool,
    pub order_count: usize,
    pub delay: Duration,
}

pub struct OrderGenerator<R> {
    rng: R,
    ids: OrderIdGenerator,
    orders: OrderStore,
    customers: CustomerPool,
    order_count: usize,
    delay: Duration,
}

impl<R: Rng> OrderGenerator<R> {
    pub fn new(cfg: Config<R>) -> Self {
        Self {
            rng: cfg.rng,
            ids: cfg.ids,
            orders: cfg.orders,
            customers: cfg.customers,
            order_count: cfg.order_count,
            delay: cfg.delay,
        }
    }

    /// Builds the next order without writing it.
    pub fn next_order(&mut self, products: &[CatalogEntry]) -> Result<Order> {
        if products.is_empty() {
            return Err(OrdersGenError::InvalidParameter(
                "product list is empty".to_string(),
            ));
        }

        let (_, customer_id) = self.customers.sample(&mut self.rng)?;
        let quantity = pick_quantity(&mut self.rng);
        let product = &products[pick_product_index(&mut self.rng, products.len())];

        Ok(Order {
            customer_id,
            order_id: self.ids.next_id(),
            date: Utc::now(),
            lines: vec![OrderLine::new(
                product.sku.as_str(),
                product.name.as_str(),
                quantity,
                product.regular_price,
            )],
        })
    }

    /// Places up to `order_count` orders. A failed write is recorded and the
    /// run goes on; a shutdown signal stops it before the next write.
    pub async fn run(
        &mut self,
        products: &[CatalogEntry],
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RunReport> {
        if products.is_empty() {
            return Err(OrdersGenError::InvalidParameter(
                "product list is empty".to_string(),
            ));
        }
        debug!(
            orders = self.order_count,
            products = products.len(),
            customers_low = self.customers.low(),
            customers_high = self.customers.high(),
            "starting order generation"
        );

        let mut report = RunReport {
            requested: self.order_count,
            ..Default::default()
        };
        for i in 0..self.order_count {
            let stop = tokio::select! {
                biased;
                _ = wait_shutdown(&mut shutdown) => true,
                _ = sleep(self.delay) => false,
            };
            if stop {
                info!("shutdown requested, stopping at iteration {i}");
                report.cancelled = true;
                break;
            }

            let order = self.next_order(products)?;
            match self.orders.insert(&order).await {
                Ok(_) => {
                    report.placed += 1;
                    counter!("orders.placed_total").increment(1);
                }
                Err(err) => {
                    let sku = order.lines[0].sku.clone();
                    warn!(
                        iteration = i,
                        customer_id = %order.customer_id,
                        sku = %sku,
                        "order write failed: {err}"
                    );
                    counter!("orders.failed_total").increment(1);
                    report.failures.push(OrderFailure {
                        iteration: i,
                        customer_id: order.customer_id,
                        sku,
                        error: err.to_string(),
                    });
                }
            }

            if i % PROGRESS_EVERY == 0 {
                info!("iteration {i}: {} orders placed", report.placed);
            }
        }

        info!(
            "order generation finished: {} requested, {} placed, {} failed{}",
            report.requested,
            report.placed,
            report.failed(),
            if report.cancelled { ", cancelled" } else { "" }
        );

        Ok(report)
    }
}
