use crate::logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{FloorPriceRow, TokenRecord};
use crate::provider::AlchemyClient;

/// Look up floor prices for every row, in row order.
///
/// One request per row, repeated contracts included. A row without a contract
/// address, or whose lookup fails, gets a row of placeholders so the result
/// always has as many rows as the input.
pub async fn lookup_floor_prices(client: &AlchemyClient, tokens: &[TokenRecord]) -> Vec<FloorPriceRow> {
    let mut rows = Vec::with_capacity(tokens.len());

    for token in tokens {
        let Some(contract) = token.contract_address.as_deref() else {
            rows.push(FloorPriceRow::unavailable(None));
            continue;
        };

        let monitor = PerformanceMonitor::new("floor_price_lookup");
        let row = match client.get_floor_price(contract).await {
            Ok(response) => FloorPriceRow::from_response(Some(contract.to_string()), response),
            Err(error) => {
                ErrorLogger::log_error(
                    &error,
                    Some(LogContext::new("price_lookup", "get_floor_price").with_contract(contract)),
                );
                FloorPriceRow::unavailable(Some(contract.to_string()))
            }
        };
        MetricsLogger::log_price_lookup(contract, monitor.elapsed_ms(), row.has_quote());

        rows.push(row);
    }

    rows
}
