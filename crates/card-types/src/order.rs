//! Order types for the card-generation order intake.
//!
//! This module defines the persisted order record together with the closed
//! enumerations it is built from: lifecycle status, payment status, service
//! tariff and target marketplace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents one customer request for a generated product card.
///
/// An order is created by its owner, optionally submitted to the remote
/// generation backend, and reconciled against the backend's view on every
/// single-order read until it reaches a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	/// Identifier of the owning user. All reads and writes are scoped by it.
	pub user_id: String,
	/// Product name as entered by the customer.
	pub product_name: String,
	/// Free-form product description.
	pub product_description: String,
	/// Target marketplace the generated card is designed for.
	pub marketplace: Marketplace,
	/// Declared price of the underlying product. Informational only; the
	/// amount charged is `total_amount`.
	pub price: u64,
	/// Selected service tariff.
	pub tariff: Tariff,
	/// Uploaded image references. Never empty for a persisted order.
	pub product_images: Vec<String>,
	/// Amount charged for the order, derived from the tariff at creation
	/// and never recomputed afterwards.
	pub total_amount: u64,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// Current payment status.
	pub payment_status: PaymentStatus,
	/// Job identifier assigned by the remote generation backend, once the
	/// submission has been acknowledged.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub backend_order_id: Option<String>,
	/// URL of the generated card, once available. Never cleared after it
	/// has been set.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub generated_card_url: Option<String>,
	/// Unix timestamp when this order was created.
	pub created_at: u64,
	/// Unix timestamp when this order was last updated.
	pub updated_at: u64,
}

/// Status of an order in the intake system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
	/// Order has been created but the backend has not acknowledged it.
	Pending,
	/// Order has been accepted by the backend and is being generated.
	Processing,
	/// Generation finished and the card URL is (or will shortly be) available.
	Completed,
	/// Generation failed.
	Failed,
}

impl OrderStatus {
	/// Returns true for statuses that end the lifecycle. Terminal orders are
	/// never reconciled against the backend again.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Completed | OrderStatus::Failed)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderStatus::Pending => write!(f, "pending"),
			OrderStatus::Processing => write!(f, "processing"),
			OrderStatus::Completed => write!(f, "completed"),
			OrderStatus::Failed => write!(f, "failed"),
		}
	}
}

impl FromStr for OrderStatus {
	type Err = String;

	/// Parses the status strings used on the backend wire contract.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(Self::Pending),
			"processing" => Ok(Self::Processing),
			"completed" => Ok(Self::Completed),
			"failed" => Ok(Self::Failed),
			other => Err(format!("unknown order status: {}", other)),
		}
	}
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
	/// No payment has been recorded.
	Unpaid,
	/// Payment has been received.
	Paid,
	/// Payment was attempted and failed.
	Failed,
}

/// Service tariff selected at order creation.
///
/// Each tariff maps to exactly one fixed price; the mapping is the single
/// authoritative source for `Order::total_amount`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tariff {
	Start,
	Pro,
}

impl Tariff {
	/// Returns the fixed total amount for this tariff, in the same currency
	/// unit as the declared product price.
	pub fn price(&self) -> u64 {
		match self {
			Tariff::Start => 299,
			Tariff::Pro => 599,
		}
	}
}

impl fmt::Display for Tariff {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Tariff::Start => write!(f, "start"),
			Tariff::Pro => write!(f, "pro"),
		}
	}
}

/// Target marketplace for the generated product card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Marketplace {
	/// Wildberries.
	#[serde(rename = "wb")]
	Wb,
	/// OZON.
	#[serde(rename = "ozon")]
	Ozon,
}

impl fmt::Display for Marketplace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Marketplace::Wb => write!(f, "wb"),
			Marketplace::Ozon => write!(f, "ozon"),
		}
	}
}
