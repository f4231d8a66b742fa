//! SQL text of the analytical queries.
//!
//! Every statement is fully parameterized. `?1` is the reference date for
//! date-relative queries, the city for city lookups, or the row limit for
//! top-N rankings. Ties are broken by the grouping key so results are
//! stable across runs.

/// Providers per city.
pub const PROVIDERS_PER_CITY: &str = r"
SELECT city, COUNT(*) AS provider_count
FROM providers
GROUP BY city
ORDER BY provider_count DESC, city ASC
";

/// Receivers per city.
pub const RECEIVERS_PER_CITY: &str = r"
SELECT city, COUNT(*) AS receiver_count
FROM receivers
GROUP BY city
ORDER BY receiver_count DESC, city ASC
";

/// Provider types ranked by total listed quantity. `?1`: limit.
pub const TOP_PROVIDER_TYPE_BY_QUANTITY: &str = r"
SELECT provider_type, SUM(quantity) AS total_quantity
FROM food_listings
GROUP BY provider_type
ORDER BY total_quantity DESC, provider_type ASC
LIMIT ?1
";

/// Provider names and contacts in a city. `?1`: city.
pub const PROVIDER_CONTACTS_BY_CITY: &str = r"
SELECT name, contact
FROM providers
WHERE city = ?1
ORDER BY name ASC, provider_id ASC
";

/// Receivers ranked by number of claims. `?1`: limit.
pub const TOP_RECEIVER_BY_CLAIMS: &str = r"
SELECT r.receiver_id, r.name, COUNT(c.claim_id) AS total_claims
FROM claims c
JOIN receivers r ON c.receiver_id = r.receiver_id
GROUP BY r.receiver_id, r.name
ORDER BY total_claims DESC, r.receiver_id ASC
LIMIT ?1
";

/// Quantity still available on the reference date. `?1`: date.
pub const TOTAL_AVAILABLE_QUANTITY: &str = r"
SELECT COALESCE(SUM(quantity), 0) AS total_available
FROM food_listings
WHERE expiry_date >= ?1
";

/// Cities ranked by number of listings. `?1`: limit.
pub const TOP_LISTING_CITY: &str = r"
SELECT location AS city, COUNT(*) AS listings_count
FROM food_listings
GROUP BY location
ORDER BY listings_count DESC, location ASC
LIMIT ?1
";

/// Food-type frequency.
pub const FOOD_TYPE_FREQUENCY: &str = r"
SELECT food_type, COUNT(*) AS count_type
FROM food_listings
GROUP BY food_type
ORDER BY count_type DESC, food_type ASC
";

/// Claims per listing; listings without claims report 0.
pub const CLAIMS_PER_FOOD_ITEM: &str = r"
SELECT f.food_id, f.food_name, COUNT(c.claim_id) AS claims_count
FROM food_listings f
LEFT JOIN claims c ON f.food_id = c.food_id
GROUP BY f.food_id, f.food_name
ORDER BY claims_count DESC, f.food_id ASC
";

/// Providers ranked by completed claims on their listings. `?1`: limit.
pub const TOP_PROVIDER_BY_COMPLETED_CLAIMS: &str = r"
SELECT p.provider_id, p.name, COUNT(c.claim_id) AS successful_claims
FROM claims c
JOIN food_listings f ON c.food_id = f.food_id
JOIN providers p ON f.provider_id = p.provider_id
WHERE c.status = 'Completed'
GROUP BY p.provider_id, p.name
ORDER BY successful_claims DESC, p.provider_id ASC
LIMIT ?1
";

/// Share of claims in each status, as a percentage rounded to 2 places.
pub const CLAIM_STATUS_PERCENTAGES: &str = r"
SELECT status,
       COUNT(*) AS claim_count,
       ROUND((COUNT(*) * 100.0) / (SELECT COUNT(*) FROM claims), 2) AS percentage
FROM claims
GROUP BY status
ORDER BY percentage DESC, status ASC
";

/// Average quantity of the listings each receiver claimed.
pub const AVERAGE_QUANTITY_PER_RECEIVER: &str = r"
SELECT r.receiver_id, r.name, ROUND(AVG(f.quantity), 2) AS avg_quantity
FROM claims c
JOIN food_listings f ON c.food_id = f.food_id
JOIN receivers r ON c.receiver_id = r.receiver_id
GROUP BY r.receiver_id, r.name
ORDER BY avg_quantity DESC, r.receiver_id ASC
";

/// Meal types ranked by number of claims. `?1`: limit.
pub const TOP_CLAIMED_MEAL_TYPE: &str = r"
SELECT f.meal_type, COUNT(c.claim_id) AS claims_count
FROM claims c
JOIN food_listings f ON c.food_id = f.food_id
GROUP BY f.meal_type
ORDER BY claims_count DESC, f.meal_type ASC
LIMIT ?1
";

/// Total listed quantity per provider; providers without listings are absent.
pub const TOTAL_DONATED_PER_PROVIDER: &str = r"
SELECT p.provider_id, p.name, SUM(f.quantity) AS total_donated
FROM food_listings f
JOIN providers p ON f.provider_id = p.provider_id
GROUP BY p.provider_id, p.name
ORDER BY total_donated DESC, p.provider_id ASC
";

/// Listings that expired before the reference date with no claim. `?1`: date.
pub const EXPIRED_UNCLAIMED: &str = r"
SELECT f.food_id, f.food_name, f.expiry_date, f.quantity
FROM food_listings f
LEFT JOIN claims c ON f.food_id = c.food_id
WHERE f.expiry_date < ?1 AND c.claim_id IS NULL
ORDER BY f.expiry_date ASC, f.food_id ASC
";

/// Cities known from providers and listing locations.
pub const DISTINCT_CITIES: &str = r"
SELECT city FROM providers WHERE city IS NOT NULL
UNION
SELECT location AS city FROM food_listings WHERE location IS NOT NULL
ORDER BY city
";

/// Provider names.
pub const DISTINCT_PROVIDER_NAMES: &str = r"
SELECT DISTINCT name FROM providers WHERE name IS NOT NULL ORDER BY name
";

/// Food types.
pub const DISTINCT_FOOD_TYPES: &str = r"
SELECT DISTINCT food_type FROM food_listings WHERE food_type IS NOT NULL ORDER BY food_type
";

/// Meal types.
pub const DISTINCT_MEAL_TYPES: &str = r"
SELECT DISTINCT meal_type FROM food_listings WHERE meal_type IS NOT NULL ORDER BY meal_type
";

/// Listings joined to their provider. `?1` city, `?2` provider name,
/// `?3` food type, `?4` meal type; a NULL parameter matches every row.
pub const FILTERED_LISTINGS: &str = r"
SELECT fl.food_id, fl.food_name, fl.quantity, fl.expiry_date,
       fl.location AS city, fl.food_type, fl.meal_type,
       p.provider_id, p.name AS provider_name, p.contact AS provider_contact
FROM food_listings fl
JOIN providers p ON p.provider_id = fl.provider_id
WHERE (?1 IS NULL OR fl.location = ?1)
  AND (?2 IS NULL OR p.name = ?2)
  AND (?3 IS NULL OR fl.food_type = ?3)
  AND (?4 IS NULL OR fl.meal_type = ?4)
ORDER BY fl.expiry_date ASC, fl.quantity DESC, fl.food_id ASC
";
