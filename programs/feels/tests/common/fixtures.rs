//! Market fixture backed by the in-memory host

use feels::{
    add_liquidity, collect_fees, initialize_market, quote_swap, remove_liquidity, swap,
    update_oracle, AccountStore, AddLiquidityParams, AddLiquidityResult, Address, Buffer,
    CollectFeesParams, CollectFeesResult, Context, FeeModelKind, FeelsEvent, FeelsResult, Holder,
    InitializeMarketParams, Market, MarketId, MemoryStore, MemoryTokenLedger, OracleState,
    Position, PriceObservation, ProtocolConfig, Record, RecordKey, RemoveLiquidityParams,
    RemoveLiquidityResult, RiskClass, SwapInstructionParams, SwapOutcome, TickArray, TokenProgram,
    UpdateOracleParams, UpdateOracleResult,
};

pub const Q64: u128 = 1u128 << 64;
pub const START_TIME: i64 = 1_700_000_000;
pub const TICK_SPACING: u16 = 10;
pub const USER_FUNDS: u64 = 1_000_000_000_000;

pub fn token_a() -> Address {
    Address::from_seed(100)
}

pub fn token_b() -> Address {
    Address::from_seed(101)
}

pub fn authority() -> Address {
    Address::from_seed(1)
}

pub fn lp() -> Address {
    Address::from_seed(2)
}

pub fn trader() -> Address {
    Address::from_seed(3)
}

pub struct TestMarket {
    pub store: MemoryStore,
    pub tokens: MemoryTokenLedger,
    pub config: ProtocolConfig,
    pub market: MarketId,
    pub now: i64,
    pub events: Vec<FeelsEvent>,
}

impl TestMarket {
    /// Market at tick 0 with spacing 10 and funded LP and trader
    pub fn new(model: FeeModelKind) -> Self {
        Self::with_config(ProtocolConfig::default(), model)
    }

    pub fn with_config(config: ProtocolConfig, model: FeeModelKind) -> Self {
        super::init_test_tracing();
        let mut fixture = Self {
            store: MemoryStore::new(),
            tokens: MemoryTokenLedger::new(),
            config,
            market: MarketId::new(token_a(), token_b()),
            now: START_TIME,
            events: Vec::new(),
        };
        for user in [lp(), trader()] {
            for mint in [token_a(), token_b()] {
                fixture
                    .tokens
                    .mint_to(Holder::User(user), mint, USER_FUNDS)
                    .unwrap();
            }
        }
        let params = InitializeMarketParams {
            token_a: token_a(),
            token_b: token_b(),
            tick_spacing: TICK_SPACING,
            initial_sqrt_price: Q64,
            risk_class: RiskClass::Normal,
            fee_model: Some(model),
        };
        let config = fixture.config;
        fixture
            .run(authority(), |ctx| initialize_market(ctx, &config, params))
            .unwrap();
        fixture
    }

    /// Run one instruction with the in-memory token ledger
    pub fn run<R>(
        &mut self,
        signer: Address,
        f: impl FnOnce(&mut Context<'_, MemoryStore, MemoryTokenLedger>) -> FeelsResult<R>,
    ) -> FeelsResult<R> {
        let mut ctx = Context::new(&self.store, &mut self.tokens, signer, self.now);
        let result = f(&mut ctx);
        self.events.append(&mut ctx.events);
        result
    }

    /// Run one instruction with a caller-supplied token program
    pub fn run_with<T: TokenProgram, R>(
        &mut self,
        token_program: &mut T,
        signer: Address,
        f: impl FnOnce(&mut Context<'_, MemoryStore, T>) -> FeelsResult<R>,
    ) -> FeelsResult<R> {
        let mut ctx = Context::new(&self.store, token_program, signer, self.now);
        let result = f(&mut ctx);
        self.events.append(&mut ctx.events);
        result
    }

    pub fn advance(&mut self, secs: i64) {
        self.now += secs;
    }

    pub fn add_liquidity(
        &mut self,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
    ) -> FeelsResult<AddLiquidityResult> {
        let params = self.add_params(tick_lower, tick_upper, liquidity);
        self.run(lp(), |ctx| add_liquidity(ctx, params))
    }

    pub fn add_params(&self, tick_lower: i32, tick_upper: i32, liquidity: u128) -> AddLiquidityParams {
        AddLiquidityParams {
            market: self.market,
            tick_lower,
            tick_upper,
            liquidity,
            position: None,
        }
    }

    pub fn remove_liquidity(
        &mut self,
        position: u64,
        liquidity: u128,
    ) -> FeelsResult<RemoveLiquidityResult> {
        let params = RemoveLiquidityParams {
            market: self.market,
            position,
            liquidity,
        };
        self.run(lp(), |ctx| remove_liquidity(ctx, params))
    }

    pub fn collect_fees(&mut self, position: u64) -> FeelsResult<CollectFeesResult> {
        let params = CollectFeesParams {
            market: self.market,
            position,
        };
        self.run(lp(), |ctx| collect_fees(ctx, params))
    }

    pub fn swap_params(&self, a_to_b: bool, amount: u64, exact_input: bool) -> SwapInstructionParams {
        SwapInstructionParams {
            market: self.market,
            is_a_to_b: a_to_b,
            amount,
            exact_input,
            sqrt_price_limit: 0,
            other_amount_threshold: if exact_input { 0 } else { u64::MAX },
        }
    }

    pub fn swap(&mut self, a_to_b: bool, amount: u64, exact_input: bool) -> FeelsResult<SwapOutcome> {
        let params = self.swap_params(a_to_b, amount, exact_input);
        self.swap_with(params)
    }

    pub fn swap_with(&mut self, params: SwapInstructionParams) -> FeelsResult<SwapOutcome> {
        self.run(trader(), |ctx| swap(ctx, params))
    }

    pub fn quote(&mut self, a_to_b: bool, amount: u64, exact_input: bool) -> FeelsResult<SwapOutcome> {
        let params = self.swap_params(a_to_b, amount, exact_input);
        self.run(trader(), |ctx| quote_swap(ctx, params))
    }

    /// Keeper refresh: report the market's own tick as of now
    pub fn update_oracle(&mut self) -> FeelsResult<UpdateOracleResult> {
        let observation = PriceObservation {
            tick: self.market_state().current_tick,
            timestamp: self.now,
        };
        self.report(authority(), observation)
    }

    pub fn report(
        &mut self,
        signer: Address,
        observation: PriceObservation,
    ) -> FeelsResult<UpdateOracleResult> {
        let params = UpdateOracleParams {
            market: self.market,
            observation,
        };
        self.run(signer, |ctx| update_oracle(ctx, params))
    }

    fn record<T: Record>(&self, key: RecordKey) -> T {
        let bytes = self.store.read(&key).expect("record present");
        T::try_deserialize(&bytes).expect("record decodes")
    }

    pub fn market_state(&self) -> Market {
        self.record(RecordKey::Market(self.market))
    }

    pub fn oracle_state(&self) -> OracleState {
        self.record(RecordKey::Oracle(self.market))
    }

    pub fn buffer_state(&self) -> Buffer {
        self.record(RecordKey::Buffer(self.market))
    }

    pub fn position(&self, id: u64) -> Option<Position> {
        let key = RecordKey::Position {
            market: self.market,
            id,
        };
        self.store
            .read(&key)
            .map(|bytes| Position::try_deserialize(&bytes).expect("record decodes"))
    }

    pub fn tick_array(&self, start_tick_index: i32) -> Option<TickArray> {
        let key = RecordKey::TickArray {
            market: self.market,
            start_tick_index,
        };
        self.store
            .read(&key)
            .map(|bytes| TickArray::try_deserialize(&bytes).expect("record decodes"))
    }

    /// Sum of liquidity_net over initialized ticks at or below `tick`
    pub fn liquidity_at(&self, tick: i32) -> u128 {
        let mut total: i128 = 0;
        for (key, bytes) in self.store.snapshot() {
            if let RecordKey::TickArray { .. } = key {
                let array = TickArray::try_deserialize(&bytes).unwrap();
                for (offset, t) in array.ticks.iter().enumerate() {
                    let index = array.start_tick_index + offset as i32 * TICK_SPACING as i32;
                    if t.initialized && index <= tick {
                        total += t.liquidity_net;
                    }
                }
            }
        }
        u128::try_from(total).unwrap()
    }

    pub fn balance(&self, user: Address, mint: Address) -> u64 {
        self.tokens.balance(Holder::User(user), mint)
    }

    pub fn vault_balance(&self, mint: Address) -> u64 {
        self.tokens.balance(Holder::Vault(self.market), mint)
    }
}
