use sourced_access::{impl_aggregate, Entity, EventRecord};

#[derive(Default, Debug)]
pub struct Account {
    pub entity: Entity,
    pub owner: String,
    pub balance: i64,
}

impl Account {
    pub fn open(id: &str, owner: &str) -> Self {
        let mut account = Account::default();
        account.entity.set_id(id);
        account.opened(owner.to_string());
        account
    }

    pub fn deposit(&mut self, amount: i64) {
        self.entity.record("Deposited", &amount).unwrap();
        self.balance += amount;
    }

    fn opened(&mut self, owner: String) {
        self.entity.record("Opened", &owner).unwrap();
        self.owner = owner;
    }

    fn replay(&mut self, event: &EventRecord) -> Result<(), String> {
        match event.name() {
            "Opened" => {
                let owner: String = event.decode().map_err(|e| e.to_string())?;
                self.opened(owner);
            }
            "Deposited" => {
                let amount: i64 = event.decode().map_err(|e| e.to_string())?;
                self.deposit(amount);
            }
            other => return Err(format!("Unknown event: {}", other)),
        }
        Ok(())
    }
}

impl_aggregate!(Account { entity, replay });
