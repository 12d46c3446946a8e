use super::*;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local balances. Used by the binary and by tests.
#[derive(Debug, Default)]
pub struct MemoryAccounts {
    balances: RwLock<HashMap<UserId, Tokens>>,
}

impl MemoryAccounts {
    pub fn with_balances<I>(balances: I) -> Self
    where
        I: IntoIterator<Item = (UserId, Tokens)>,
    {
        Self {
            balances: RwLock::new(balances.into_iter().collect()),
        }
    }
}

#[async_trait::async_trait]
impl Accounts for MemoryAccounts {
    async fn balance(&self, user: &UserId) -> Result<Tokens, AccountsError> {
        Ok(self
            .balances
            .read()
            .await
            .get(user)
            .copied()
            .unwrap_or_default())
    }
    async fn adjust(&self, user: &UserId, delta: Adjustment) -> Result<Tokens, AccountsError> {
        let mut balances = self.balances.write().await;
        let balance = balances.get(user).copied().unwrap_or_default();
        let updated = match delta {
            Adjustment::Credit(amount) => balance.try_add(amount)?,
            Adjustment::Debit(amount) => {
                balance
                    .try_sub(amount)
                    .map_err(|_| AccountsError::Insufficient {
                        user: user.clone(),
                        balance,
                        requested: amount,
                    })?
            }
        };
        balances.insert(user.clone(), updated);
        log::debug!("[accounts] {} {} -> {}", user, delta, updated);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[tokio::test]
    async fn unknown_user_holds_nothing() {
        let accounts = MemoryAccounts::default();
        assert_eq!(accounts.balance(&"x".into()).await, Ok(Tokens::ZERO));
    }
    #[tokio::test]
    async fn credit_then_debit() {
        let accounts = MemoryAccounts::default();
        let user = UserId::from("a");
        let after = accounts
            .adjust(&user, Adjustment::Credit(Tokens::whole(30)))
            .await
            .unwrap();
        assert_eq!(after, Tokens::whole(30));
        let after = accounts
            .adjust(&user, Adjustment::Debit(Tokens::whole(12)))
            .await
            .unwrap();
        assert_eq!(after, Tokens::whole(18));
        assert_eq!(accounts.balance(&user).await, Ok(Tokens::whole(18)));
    }
    #[tokio::test]
    async fn debit_never_overdraws() {
        let accounts = MemoryAccounts::with_balances([("a".into(), Tokens::whole(5))]);
        let user = UserId::from("a");
        assert!(matches!(
            accounts
                .adjust(&user, Adjustment::Debit(Tokens::whole(6)))
                .await,
            Err(AccountsError::Insufficient { .. })
        ));
        assert_eq!(accounts.balance(&user).await, Ok(Tokens::whole(5)));
    }
}
