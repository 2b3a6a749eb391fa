//! Sales aggregation and export.

use serde::Serialize;

use crate::models::{PaymentMethod, TicketDetails, TicketStatus};
use crate::money;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodTally {
    pub count: i64,
    pub total_cents: i64,
}

/// Totals over a set of tickets. Sales, revenue and the per-method breakdown
/// only count tickets that were not cancelled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesStats {
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    pub total_cancelled: i64,
    pub total_used: i64,
    pub total_active: i64,
    pub dinheiro: MethodTally,
    pub pix: MethodTally,
    pub cartao: MethodTally,
}

impl SalesStats {
    pub fn tally<'a>(tickets: impl IntoIterator<Item = &'a TicketDetails>) -> Self {
        let mut stats = SalesStats::default();

        for ticket in tickets {
            let status = ticket.status();

            if status != Some(TicketStatus::Cancelled) {
                let price = i64::from(ticket.price);
                stats.total_sales += 1;
                stats.total_revenue_cents += price;

                if let Some(method) = ticket.payment_method() {
                    let tally = stats.method_mut(method);
                    tally.count += 1;
                    tally.total_cents += price;
                }
            }

            match status {
                Some(TicketStatus::Cancelled) => stats.total_cancelled += 1,
                Some(TicketStatus::Used) => stats.total_used += 1,
                Some(TicketStatus::Active) => stats.total_active += 1,
                None => {}
            }
        }

        stats
    }

    pub fn method(&self, method: PaymentMethod) -> MethodTally {
        match method {
            PaymentMethod::Dinheiro => self.dinheiro,
            PaymentMethod::Pix => self.pix,
            PaymentMethod::Cartao => self.cartao,
        }
    }

    fn method_mut(&mut self, method: PaymentMethod) -> &mut MethodTally {
        match method {
            PaymentMethod::Dinheiro => &mut self.dinheiro,
            PaymentMethod::Pix => &mut self.pix,
            PaymentMethod::Cartao => &mut self.cartao,
        }
    }

    pub fn view(&self) -> SalesStatsView {
        SalesStatsView {
            total_sales: self.total_sales,
            total_revenue: money::from_cents_total(self.total_revenue_cents),
            total_cancelled: self.total_cancelled,
            total_used: self.total_used,
            total_active: self.total_active,
            payment_methods: PaymentMethodsView {
                dinheiro: self.dinheiro.into(),
                pix: self.pix.into(),
                cartao: self.cartao.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesStatsView {
    pub total_sales: i64,
    pub total_revenue: f64,
    pub total_cancelled: i64,
    pub total_used: i64,
    pub total_active: i64,
    pub payment_methods: PaymentMethodsView,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethodsView {
    pub dinheiro: MethodTallyView,
    pub pix: MethodTallyView,
    pub cartao: MethodTallyView,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodTallyView {
    pub count: i64,
    pub total: f64,
}

impl From<MethodTally> for MethodTallyView {
    fn from(t: MethodTally) -> Self {
        Self {
            count: t.count,
            total: money::from_cents_total(t.total_cents),
        }
    }
}

/// Render the sales report as CSV.
pub fn sales_csv(tickets: &[TicketDetails]) -> Result<String, String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record([
            "id",
            "created_at",
            "ticket_type",
            "customer",
            "payment_method",
            "status",
            "price",
        ])
        .map_err(|e| format!("CSV write failed: {e}"))?;

    for ticket in tickets {
        writer
            .write_record([
                ticket.id.to_string(),
                ticket.created_at.to_rfc3339(),
                ticket.ticket_type_name.clone().unwrap_or_default(),
                ticket.customer_name.clone().unwrap_or_default(),
                ticket.payment_method.clone(),
                ticket.status.clone(),
                format!("{:.2}", money::from_cents(ticket.price)),
            ])
            .map_err(|e| format!("CSV write failed: {e}"))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| format!("CSV flush failed: {}", e.error()))?;
    String::from_utf8(bytes).map_err(|e| format!("CSV is not UTF-8: {e}"))
}
