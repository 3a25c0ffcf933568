use anyhow::anyhow;

/// Connectivity represents the "connected" state of a mocked driven port and provides
/// common behavior for returning an error if the port is configured to be in a
/// disconnected state.
pub enum Connectivity {
    Connected,
    Disconnected,
}

impl Connectivity {
    /// Return an error if connectivity is in a "disconnected" state
    pub fn blow_up_if_disconnected(&self) -> Result<(), anyhow::Error> {
        match self {
            Self::Connected => Ok(()),
            Self::Disconnected => Err(anyhow!("could not connect to service!")),
        }
    }
}

/// FakeImplementation is a quick drop-in property that helps mock a single function on a
/// trait and capture the arguments it was called with. Popular mocking crates still don't
/// cope well with async functions on traits, so mocks in this codebase are composed of one
/// of these per trait function.
///
/// * [Args] is the argument set captured on each call (use a tuple for multiple arguments)
/// * [Ret] is the function's return type
///
/// Mock trait implementations live on `Mutex<TheMock>` so the interior is mutable through
/// the `&self` the trait hands out:
///
/// ```
/// use domain::test_util::FakeImplementation;
/// use std::sync::Mutex;
///
/// trait MyAsyncTrait {
///   async fn some_cool_function(&self, var_1: i32, var_2: i32) -> String;
/// }
///
/// struct FakeTraitImplementation {
///   some_cool_function_result: FakeImplementation<(i32, i32), String>,
/// }
///
/// impl MyAsyncTrait for Mutex<FakeTraitImplementation> {
///   async fn some_cool_function(&self, var_1: i32, var_2: i32) -> String {
///     let mut self_locked = self.lock().unwrap();
///     self_locked.some_cool_function_result.save_arguments((var_1, var_2));
///     self_locked.some_cool_function_result.return_value()
///   }
/// }
/// ```
pub struct FakeImplementation<Args, Ret> {
    saved_arguments: Vec<Args>,
    return_value: Option<Ret>,
}

impl<Args, Ret> FakeImplementation<Args, Ret> {
    /// Creates a new FakeImplementation
    pub fn new() -> FakeImplementation<Args, Ret> {
        FakeImplementation {
            saved_arguments: Vec::new(),
            return_value: None,
        }
    }

    /// Saves arguments from a single invocation of the FakeImplementation
    pub fn save_arguments(&mut self, arguments: Args) {
        self.saved_arguments.push(arguments)
    }

    /// Returns the list of arguments passed on every call to this FakeImplementation
    pub fn calls(&self) -> &[Args] {
        self.saved_arguments.as_slice()
    }
}

#[allow(dead_code)]
impl<Args, Ret> FakeImplementation<Args, Ret>
where
    Ret: Clone,
{
    /// Set the value that should be returned when this FakeImplementation is invoked
    pub fn set_return_value(&mut self, return_value: Ret) {
        self.return_value = Some(return_value)
    }

    /// Retrieve the configured return value for this FakeImplementation
    pub fn return_value(&self) -> Ret {
        match self.return_value {
            None => panic!("Tried to return from a function where the return value wasn't set!"),
            Some(ref ret_val) => ret_val.clone(),
        }
    }
}

impl<Args, Success, Fail> FakeImplementation<Args, Result<Success, Fail>>
where
    Success: Clone,
    Fail: Clone,
{
    /// Set the result that should be returned when this FakeImplementation is invoked.
    /// [Result] does not implement [Clone], so this function can be used when the contained
    /// values can be cloned.
    pub fn set_returned_result(&mut self, return_value: Result<Success, Fail>) {
        match return_value {
            Ok(ok_result) => self.return_value = Some(Ok(ok_result)),
            Err(err) => self.return_value = Some(Err(err)),
        }
    }

    /// Retrieve the result that should be returned when this FakeImplementation is invoked
    /// (for [Result]s)
    pub fn return_value_result(&self) -> Result<Success, Fail> {
        match self.return_value {
            Some(Ok(ref ok_result)) => Ok(ok_result.clone()),
            Some(Err(ref err)) => Err(err.clone()),
            None => panic!("Tried to return from a function where the return value wasn't set!"),
        }
    }
}

#[allow(dead_code)]
impl<Args, Success> FakeImplementation<Args, anyhow::Result<Success>>
where
    Success: Clone,
{
    /// Set the result that should be returned when this FakeImplementation is invoked.
    /// This is a special case for [anyhow::Result], since [anyhow::Error] does not
    /// implement [Clone].
    pub fn set_returned_anyhow(&mut self, return_value: anyhow::Result<Success>) {
        match return_value {
            Ok(ok_result) => self.return_value = Some(Ok(ok_result)),
            Err(err) => self.return_value = Some(Err(anyhow!(format!("{}", err)))),
        }
    }

    /// Retrieve the result that should be returned when this FakeImplementation is invoked
    /// (for [anyhow::Result]s)
    pub fn return_value_anyhow(&self) -> anyhow::Result<Success> {
        match self.return_value {
            None => panic!("Tried to return from a function where the value wasn't set!"),
            Some(Ok(ref ok_result)) => Ok(ok_result.clone()),
            Some(Err(ref err)) => Err(anyhow!(format!("{}", err))),
        }
    }
}
