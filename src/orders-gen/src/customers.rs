use std::ops::RangeInclusive;

use rand::Rng;
use uuid::Uuid;

use crate::error::OrdersGenError;
use crate::error::Result;

/// All generated customer ids share this prefix; the last three hex digits
/// carry the customer number in decimal.
pub const CUSTOMER_ID_PREFIX: &str = "a4a70900-24e1-11df-8924-001ff3591";
pub const MAX_CUSTOMER_NUMBER: u32 = 999;

pub fn encode(number: u32) -> Result<Uuid> {
    if number > MAX_CUSTOMER_NUMBER {
        return Err(OrdersGenError::CustomerIdOutOfRange(
            number,
            MAX_CUSTOMER_NUMBER,
        ));
    }

    Uuid::parse_str(&format!("{CUSTOMER_ID_PREFIX}{number:03}"))
        .map_err(|err| OrdersGenError::Internal(err.to_string()))
}

pub fn decode(id: &Uuid) -> Result<u32> {
    let s = id.hyphenated().to_string();
    let suffix = s
        .strip_prefix(CUSTOMER_ID_PREFIX)
        .ok_or_else(|| OrdersGenError::InvalidCustomerId(s.clone()))?;
    if !suffix.chars().all(|c| c.is_ascii_digit()) {
        return Err(OrdersGenError::InvalidCustomerId(s));
    }

    suffix
        .parse()
        .map_err(|_| OrdersGenError::InvalidCustomerId(s.clone()))
}

/// Contiguous range of customer numbers orders are drawn from.
#[derive(Debug, Clone)]
pub struct CustomerPool {
    range: RangeInclusive<u32>,
}

impl CustomerPool {
    pub fn try_new(low: u32, high: u32) -> Result<Self> {
        if low > high {
            return Err(OrdersGenError::InvalidParameter(format!(
                "customer pool low {low} is greater than high {high}"
            )));
        }
        if high > MAX_CUSTOMER_NUMBER {
            return Err(OrdersGenError::CustomerIdOutOfRange(
                high,
                MAX_CUSTOMER_NUMBER,
            ));
        }

        Ok(Self { range: low..=high })
    }

    pub fn low(&self) -> u32 {
        *self.range.start()
    }

    pub fn high(&self) -> u32 {
        *self.range.end()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        match decode(id) {
            Ok(n) => self.range.contains(&n),
            Err(_) => false,
        }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Result<(u32, Uuid)> {
        let n = rng.gen_range(self.range.clone());

        Ok((n, encode(n)?))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    use crate::customers::decode;
    use crate::customers::encode;
    use crate::customers::CustomerPool;

    #[test]
    fn test_encode() {
        assert_eq!(
            encode(700).unwrap().to_string(),
            "a4a70900-24e1-11df-8924-001ff3591700"
        );
        assert_eq!(
            encode(7).unwrap().to_string(),
            "a4a70900-24e1-11df-8924-001ff3591007"
        );
        assert_eq!(encode(700).unwrap(), encode(700).unwrap());
        assert!(encode(1000).is_err());
    }

    #[test]
    fn test_decode_inverts_encode() {
        for n in [0, 7, 70, 700, 800, 999] {
            assert_eq!(decode(&encode(n).unwrap()).unwrap(), n);
        }

        assert!(decode(&Uuid::new_v4()).is_err());
        let hex = Uuid::parse_str("a4a70900-24e1-11df-8924-001ff35917af").unwrap();
        assert!(decode(&hex).is_err());
    }

    #[test]
    fn test_pool() {
        assert!(CustomerPool::try_new(701, 700).is_err());
        assert!(CustomerPool::try_new(700, 1000).is_err());

        let pool = CustomerPool::try_new(700, 701).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let (n, id) = pool.sample(&mut rng).unwrap();
            assert!(n == 700 || n == 701);
            assert!(pool.contains(&id));
        }
        assert!(!pool.contains(&encode(702).unwrap()));

        let single = CustomerPool::try_new(5, 5).unwrap();
        assert_eq!(single.sample(&mut rng).unwrap().0, 5);
    }
}
