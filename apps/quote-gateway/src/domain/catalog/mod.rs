//! Asset Catalog
//!
//! Static lookup table backing symbol search. The table is a curated list
//! of popular crypto pairs and equities; it is not an exchange directory.

use serde::Serialize;

/// Maximum number of search results returned.
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Asset class label shown in search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CatalogKind {
    /// Crypto pair.
    Crypto,
    /// Listed equity.
    Stock,
}

/// One searchable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Ticker as accepted by the gateway.
    pub symbol: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Asset class.
    #[serde(rename = "type")]
    pub kind: CatalogKind,
}

const fn entry(symbol: &'static str, name: &'static str, kind: CatalogKind) -> CatalogEntry {
    CatalogEntry { symbol, name, kind }
}

/// Find assets whose symbol or name contains `query`, ignoring case.
///
/// Results keep catalog order and are capped at [`MAX_SEARCH_RESULTS`].
/// An empty query matches everything.
#[must_use]
pub fn search(query: &str) -> Vec<CatalogEntry> {
    let needle = query.trim().to_uppercase();
    ASSETS
        .iter()
        .filter(|asset| {
            asset.symbol.to_uppercase().contains(&needle)
                || asset.name.to_uppercase().contains(&needle)
        })
        .take(MAX_SEARCH_RESULTS)
        .copied()
        .collect()
}

#[rustfmt::skip]
static ASSETS: &[CatalogEntry] = &[
    entry("BTC/USDT", "Bitcoin", CatalogKind::Crypto),
    entry("ETH/USDT", "Ethereum", CatalogKind::Crypto),
    entry("USDT/USDT", "Tether", CatalogKind::Crypto),
    entry("XRP/USDT", "XRP", CatalogKind::Crypto),
    entry("BNB/USDT", "BNB", CatalogKind::Crypto),
    entry("SOL/USDT", "Solana", CatalogKind::Crypto),
    entry("USDC/USDT", "USDC", CatalogKind::Crypto),
    entry("STETH/USDT", "Lido Staked Ether", CatalogKind::Crypto),
    entry("TRX/USDT", "TRON", CatalogKind::Crypto),
    entry("DOGE/USDT", "Dogecoin", CatalogKind::Crypto),
    entry("ADA/USDT", "Cardano", CatalogKind::Crypto),
    entry("WSTETH/USDT", "Wrapped stETH", CatalogKind::Crypto),
    entry("BCH/USDT", "Bitcoin Cash", CatalogKind::Crypto),
    entry("WBETH/USDT", "Wrapped Beacon ETH", CatalogKind::Crypto),
    entry("WBTC/USDT", "Wrapped Bitcoin", CatalogKind::Crypto),
    entry("WEETH/USDT", "Wrapped eETH", CatalogKind::Crypto),
    entry("USDS/USDT", "USDS", CatalogKind::Crypto),
    entry("LINK/USDT", "Chainlink", CatalogKind::Crypto),
    entry("BSC-USD/USDT", "Binance Bridged USDT", CatalogKind::Crypto),
    entry("LEO/USDT", "LEO Token", CatalogKind::Crypto),
    entry("WETH/USDT", "WETH", CatalogKind::Crypto),
    entry("XMR/USDT", "Monero", CatalogKind::Crypto),
    entry("ZEC/USDT", "Zcash", CatalogKind::Crypto),
    entry("XLM/USDT", "Stellar", CatalogKind::Crypto),
    entry("SUI/USDT", "Sui", CatalogKind::Crypto),
    entry("CBBTC/USDT", "Coinbase Wrapped BTC", CatalogKind::Crypto),
    entry("HYPE/USDT", "Hyperliquid", CatalogKind::Crypto),
    entry("LTC/USDT", "Litecoin", CatalogKind::Crypto),
    entry("USDE/USDT", "Ethena USDe", CatalogKind::Crypto),
    entry("AVAX/USDT", "Avalanche", CatalogKind::Crypto),
    entry("NVDA", "Nvidia Corp", CatalogKind::Stock),
    entry("GOOGL", "Alphabet Inc.", CatalogKind::Stock),
    entry("AAPL", "Apple Inc.", CatalogKind::Stock),
    entry("MSFT", "Microsoft Corp", CatalogKind::Stock),
    entry("AMZN", "Amazon.com Inc", CatalogKind::Stock),
    entry("TSM", "Taiwan Semiconductor", CatalogKind::Stock),
    entry("META", "Meta Platforms Inc", CatalogKind::Stock),
    entry("AVGO", "Broadcom Inc", CatalogKind::Stock),
    entry("2222.SR", "Saudi Aramco", CatalogKind::Stock),
    entry("TSLA", "Tesla Inc.", CatalogKind::Stock),
    entry("BRK.B", "Berkshire Hathaway Inc", CatalogKind::Stock),
    entry("LLY", "Eli Lilly and Co", CatalogKind::Stock),
    entry("JPM", "JPMorgan Chase & Co", CatalogKind::Stock),
    entry("WMT", "Walmart Inc", CatalogKind::Stock),
    entry("TCEHY", "Tencent Holdings", CatalogKind::Stock),
    entry("V", "Visa Inc", CatalogKind::Stock),
    entry("005930.KS", "Samsung Electronics", CatalogKind::Stock),
    entry("ORCL", "Oracle Corp", CatalogKind::Stock),
    entry("MA", "Mastercard Inc", CatalogKind::Stock),
    entry("XOM", "Exxon Mobil Corp", CatalogKind::Stock),
    entry("JNJ", "Johnson & Johnson", CatalogKind::Stock),
    entry("ASML", "ASML Holding NV", CatalogKind::Stock),
    entry("PLTR", "Palantir Technologies", CatalogKind::Stock),
    entry("BAC", "Bank of America Corp", CatalogKind::Stock),
    entry("ABBV", "AbbVie Inc", CatalogKind::Stock),
    entry("COST", "Costco Wholesale Corp", CatalogKind::Stock),
    entry("NFLX", "Netflix Inc", CatalogKind::Stock),
    entry("MU", "Micron Technology", CatalogKind::Stock),
    entry("601288.SS", "Agri Bank of China", CatalogKind::Stock),
    entry("000660.KS", "SK Hynix", CatalogKind::Stock),
    entry("MC.PA", "LVMH", CatalogKind::Stock),
    entry("BABA", "Alibaba Group", CatalogKind::Stock),
    entry("1398.HK", "ICBC", CatalogKind::Stock),
    entry("HD", "The Home Depot Inc", CatalogKind::Stock),
    entry("GE", "GE Aerospace", CatalogKind::Stock),
    entry("AMD", "Advanced Micro Devices", CatalogKind::Stock),
    entry("ROG.SW", "Roche Holding AG", CatalogKind::Stock),
    entry("601939.SS", "China Construction Bank", CatalogKind::Stock),
    entry("PG", "Procter & Gamble Co", CatalogKind::Stock),
    entry("CVX", "Chevron Corp", CatalogKind::Stock),
    entry("UNH", "UnitedHealth Group", CatalogKind::Stock),
    entry("WFC", "Wells Fargo & Co", CatalogKind::Stock),
    entry("CSCO", "Cisco Systems Inc", CatalogKind::Stock),
    entry("AZN", "AstraZeneca PLC", CatalogKind::Stock),
    entry("MS", "Morgan Stanley", CatalogKind::Stock),
    entry("KO", "The Coca-Cola Co", CatalogKind::Stock),
    entry("GS", "Goldman Sachs Group", CatalogKind::Stock),
    entry("SAP", "SAP SE", CatalogKind::Stock),
    entry("CAT", "Caterpillar Inc", CatalogKind::Stock),
    entry("TM", "Toyota Motor Corp", CatalogKind::Stock),
    entry("PRX.AS", "Prosus NV", CatalogKind::Stock),
    entry("IBM", "International Business Machines", CatalogKind::Stock),
    entry("HSBC", "HSBC Holdings PLC", CatalogKind::Stock),
    entry("NVS", "Novartis AG", CatalogKind::Stock),
    entry("MRK", "Merck & Co Inc", CatalogKind::Stock),
    entry("AXP", "American Express Co", CatalogKind::Stock),
    entry("RMS.PA", "Hermès International", CatalogKind::Stock),
    entry("LRCX", "Lam Research Corp", CatalogKind::Stock),
    entry("601988.SS", "Bank of China", CatalogKind::Stock),
    entry("CRM", "Salesforce Inc", CatalogKind::Stock),
    entry("TMO", "Thermo Fisher Scientific", CatalogKind::Stock),
    entry("ABT", "Abbott Laboratories", CatalogKind::Stock),
    entry("LIN", "Linde PLC", CatalogKind::Stock),
    entry("PEP", "PepsiCo Inc", CatalogKind::Stock),
    entry("DIS", "The Walt Disney Co", CatalogKind::Stock),
    entry("QCOM", "QUALCOMM Inc", CatalogKind::Stock),
    entry("PM", "Philip Morris International", CatalogKind::Stock),
    entry("INTU", "Intuit Inc", CatalogKind::Stock),
    entry("TXN", "Texas Instruments", CatalogKind::Stock),
    entry("AMAT", "Applied Materials Inc", CatalogKind::Stock),
    entry("INTC", "Intel Corp", CatalogKind::Stock),
    entry("RTX", "RTX Corp", CatalogKind::Stock),
    entry("PFE", "Pfizer Inc", CatalogKind::Stock),
    entry("NEE", "NextEra Energy", CatalogKind::Stock),
    entry("DHR", "Danaher Corp", CatalogKind::Stock),
    entry("HON", "Honeywell International", CatalogKind::Stock),
    entry("UNP", "Union Pacific Corp", CatalogKind::Stock),
    entry("LOW", "Lowe's Companies Inc", CatalogKind::Stock),
    entry("SPGI", "S&P Global Inc", CatalogKind::Stock),
    entry("VRTX", "Vertex Pharmaceuticals", CatalogKind::Stock),
    entry("EL", "Estée Lauder Companies", CatalogKind::Stock),
    entry("CDNS", "Cadence Design Systems", CatalogKind::Stock),
    entry("SNPS", "Synopsys Inc", CatalogKind::Stock),
    entry("MDT", "Medtronic PLC", CatalogKind::Stock),
    entry("BX", "Blackstone Inc", CatalogKind::Stock),
    entry("DE", "Deere & Co", CatalogKind::Stock),
    entry("SHOP", "Shopify Inc", CatalogKind::Stock),
    entry("BKNG", "Booking Holdings Inc", CatalogKind::Stock),
    entry("ADP", "Automatic Data Processing", CatalogKind::Stock),
    entry("C", "Citigroup Inc", CatalogKind::Stock),
    entry("TJX", "TJX Companies Inc", CatalogKind::Stock),
    entry("MDLZ", "Mondelez International", CatalogKind::Stock),
    entry("LMT", "Lockheed Martin Corp", CatalogKind::Stock),
    entry("GILD", "Gilead Sciences Inc", CatalogKind::Stock),
    entry("CB", "Chubb Limited", CatalogKind::Stock),
    entry("PGR", "Progressive Corp", CatalogKind::Stock),
    entry("SYK", "Stryker Corp", CatalogKind::Stock),
    entry("ZTS", "Zoetis Inc", CatalogKind::Stock),
    entry("REGN", "Regeneron Pharmaceuticals", CatalogKind::Stock),
    entry("FI", "Fiserv Inc", CatalogKind::Stock),
    entry("SCHW", "Charles Schwab Corp", CatalogKind::Stock),
    entry("TMUS", "T-Mobile US Inc", CatalogKind::Stock),
    entry("T", "AT&T Inc", CatalogKind::Stock),
    entry("VZ", "Verizon Communications", CatalogKind::Stock),
    entry("BSX", "Boston Scientific Corp", CatalogKind::Stock),
    entry("CVS", "CVS Health Corp", CatalogKind::Stock),
    entry("BMY", "Bristol-Myers Squibb", CatalogKind::Stock),
    entry("AMGN", "Amgen Inc", CatalogKind::Stock),
    entry("CI", "The Cigna Group", CatalogKind::Stock),
    entry("UBER", "Uber Technologies Inc", CatalogKind::Stock),
    entry("PANW", "Palo Alto Networks", CatalogKind::Stock),
    entry("ETN", "Eaton Corp PLC", CatalogKind::Stock),
    entry("SNOW", "Snowflake Inc", CatalogKind::Stock),
    entry("MCD", "McDonald's Corp", CatalogKind::Stock),
    entry("SBUX", "Starbucks Corp", CatalogKind::Stock),
    entry("ANET", "Arista Networks Inc", CatalogKind::Stock),
    entry("KLAC", "KLA Corp", CatalogKind::Stock),
    entry("ADBE", "Adobe Inc", CatalogKind::Stock),
    entry("PYPL", "PayPal Holdings Inc", CatalogKind::Stock),
    entry("SHW", "Sherwin-Williams Co", CatalogKind::Stock),
    entry("NKE", "NIKE Inc", CatalogKind::Stock),
    entry("ECL", "Ecolab Inc", CatalogKind::Stock),
    entry("EQIX", "Equinix Inc", CatalogKind::Stock),
    entry("PH", "Parker-Hannifin Corp", CatalogKind::Stock),
    entry("WM", "Waste Management Inc", CatalogKind::Stock),
    entry("ICE", "Intercontinental Exchange", CatalogKind::Stock),
    entry("MMC", "Marsh & McLennan", CatalogKind::Stock),
    entry("USB", "U.S. Bancorp", CatalogKind::Stock),
    entry("TGT", "Target Corp", CatalogKind::Stock),
    entry("ORLY", "O'Reilly Automotive", CatalogKind::Stock),
    entry("CMG", "Chipotle Mexican Grill", CatalogKind::Stock),
    entry("MCK", "McKesson Corp", CatalogKind::Stock),
    entry("MO", "Altria Group Inc", CatalogKind::Stock),
    entry("PNC", "PNC Financial Services", CatalogKind::Stock),
    entry("MPC", "Marathon Petroleum", CatalogKind::Stock),
    entry("EMR", "Emerson Electric Co", CatalogKind::Stock),
    entry("HCA", "HCA Healthcare Inc", CatalogKind::Stock),
    entry("COF", "Capital One Financial", CatalogKind::Stock),
    entry("NSC", "Norfolk Southern Corp", CatalogKind::Stock),
    entry("ROP", "Roper Technologies", CatalogKind::Stock),
    entry("AIG", "American International Group", CatalogKind::Stock),
    entry("EOG", "EOG Resources Inc", CatalogKind::Stock),
    entry("SLB", "Schlumberger Limited", CatalogKind::Stock),
    entry("ABNB", "Airbnb Inc", CatalogKind::Stock),
    entry("MAR", "Marriott International", CatalogKind::Stock),
    entry("PSX", "Phillips 66", CatalogKind::Stock),
    entry("KMB", "Kimberly-Clark Corp", CatalogKind::Stock),
    entry("MET", "MetLife Inc", CatalogKind::Stock),
    entry("AJG", "Arthur J. Gallagher & Co", CatalogKind::Stock),
    entry("FDX", "FedEx Corp", CatalogKind::Stock),
    entry("STZ", "Constellation Brands", CatalogKind::Stock),
    entry("MCO", "Moody's Corp", CatalogKind::Stock),
    entry("CME", "CME Group Inc", CatalogKind::Stock),
    entry("GD", "General Dynamics Corp", CatalogKind::Stock),
    entry("ITW", "Illinois Tool Works", CatalogKind::Stock),
    entry("TRV", "The Travelers Companies", CatalogKind::Stock),
    entry("EIX", "Edison International", CatalogKind::Stock),
    entry("DUK", "Duke Energy Corp", CatalogKind::Stock),
    entry("AEP", "American Electric Power", CatalogKind::Stock),
    entry("SO", "Southern Co", CatalogKind::Stock),
    entry("APD", "Air Products & Chemicals", CatalogKind::Stock),
    entry("BKR", "Baker Hughes Co", CatalogKind::Stock),
    entry("VLO", "Valero Energy Corp", CatalogKind::Stock),
    entry("WELL", "Welltower Inc", CatalogKind::Stock),
    entry("PSA", "Public Storage", CatalogKind::Stock),
    entry("O", "Realty Income Corp", CatalogKind::Stock),
    entry("NOC", "Northrop Grumman Corp", CatalogKind::Stock),
    entry("OXY", "Occidental Petroleum", CatalogKind::Stock),
    entry("ADM", "Archer-Daniels-Midland", CatalogKind::Stock),
    entry("KR", "The Kroger Co", CatalogKind::Stock),
    entry("D", "Dominion Energy Inc", CatalogKind::Stock),
    entry("PCG", "PG&E Corp", CatalogKind::Stock),
    entry("CNP", "CenterPoint Energy", CatalogKind::Stock),
    entry("EXC", "Exelon Corp", CatalogKind::Stock),
    entry("XEL", "Xcel Energy Inc", CatalogKind::Stock),
    entry("F", "Ford Motor Co", CatalogKind::Stock),
    entry("GM", "General Motors Co", CatalogKind::Stock),
    entry("MCHP", "Microchip Technology", CatalogKind::Stock),
    entry("TEL", "TE Connectivity Ltd", CatalogKind::Stock),
    entry("APH", "Amphenol Corp", CatalogKind::Stock),
    entry("KEYS", "Keysight Technologies", CatalogKind::Stock),
    entry("FTNT", "Fortinet Inc", CatalogKind::Stock),
    entry("WDAY", "Workday Inc", CatalogKind::Stock),
    entry("LULU", "Lululemon Athletica", CatalogKind::Stock),
    entry("MNST", "Monster Beverage Corp", CatalogKind::Stock),
    entry("KDP", "Keurig Dr Pepper Inc", CatalogKind::Stock),
    entry("K", "Kellogg Co", CatalogKind::Stock),
    entry("GIS", "General Mills Inc", CatalogKind::Stock),
    entry("CL", "Colgate-Palmolive Co", CatalogKind::Stock),
    entry("HSY", "The Hershey Co", CatalogKind::Stock),
    entry("DASH", "DoorDash Inc", CatalogKind::Stock),
    entry("MKTX", "MarketAxess Holdings", CatalogKind::Stock),
    entry("URBN", "Urban Outfitters", CatalogKind::Stock),
];

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_matches_symbol() {
        let results = search("btc");
        assert!(results.len() <= MAX_SEARCH_RESULTS);
        assert_eq!(results[0].symbol, "BTC/USDT");
        assert_eq!(results[0].name, "Bitcoin");
        assert_eq!(results[0].kind, CatalogKind::Crypto);
    }

    #[test]
    fn search_matches_name() {
        let results = search("apple");
        assert!(results.iter().any(|a| a.symbol == "AAPL"));
    }

    #[test]
    fn search_is_capped() {
        assert_eq!(search("").len(), MAX_SEARCH_RESULTS);
        assert_eq!(search("a").len(), MAX_SEARCH_RESULTS);
    }

    #[test]
    fn search_without_match_is_empty() {
        assert!(search("ZZZZZZ").is_empty());
    }

    #[test]
    fn catalog_symbols_are_unique() {
        let mut symbols: Vec<_> = ASSETS.iter().map(|a| a.symbol).collect();
        let total = symbols.len();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), total);
    }

    #[test]
    fn entry_serializes_with_type_field() {
        let json = serde_json::to_value(ASSETS[0]).unwrap();
        assert_eq!(json["symbol"], "BTC/USDT");
        assert_eq!(json["name"], "Bitcoin");
        assert_eq!(json["type"], "Crypto");
    }
}
